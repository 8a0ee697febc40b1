//! Schema construction and field resolution errors.

use std::fmt;

use displaydoc::Display;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;
use thiserror::Error;

use crate::json_ext::Object;

/// Errors in type and resolver declarations, detected while the schema is built.
///
/// These are never surfaced to API callers: they abort schema construction.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// cyclic reference to '{type_name}' while it is still under construction
    CyclicType {
        /// The type re-entered during its own construction.
        type_name: String,
    },

    /// unsupported type '{type_name}' for {context} '{owner}.{field}'
    UnsupportedFieldType {
        /// The type declaring the field.
        owner: String,
        /// The declared field name.
        field: String,
        /// The Rust type of the field.
        type_name: String,
        /// What the field was being turned into.
        context: &'static str,
    },

    /// unsupported argument type [{position}]: '{type_name}'
    UnsupportedArgumentType { position: usize, type_name: String },

    /// more than one 'arguments' parameter [{position}]: '{type_name}'
    MultipleArgumentBundles { position: usize, type_name: String },

    /// more than one source parameter [{position}]: '{type_name}'
    MultipleSources { position: usize, type_name: String },

    /// root operation '{operation}' cannot take a source parameter '{type_name}'
    UnexpectedSource {
        operation: String,
        type_name: String,
    },

    /// field resolver '{field}' needs a source parameter
    MissingSource { field: String },

    /// field '{field}' of '{object}' is not marked as resolved
    FieldNotResolvable { object: String, field: String },

    /// expect a sequence of results, but '{type_name}' in result [{position}]
    ExpectedSequenceResult { position: usize, type_name: String },

    /// result type '{actual}' does not match type '{expected}' of field '{object}.{field}'
    ResultTypeMismatch {
        object: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// unsupported resolver result [{position}]: '{type_name}'
    UnsupportedResultType { position: usize, type_name: String },

    /// more than one result [{position}]: '{type_name}'
    MultipleResults { position: usize, type_name: String },

    /// resolver '{operation}' returns no result value
    MissingResult { operation: String },

    /// malformed default value for '{owner}.{field}': {reason}
    MalformedDefault {
        owner: String,
        field: String,
        reason: String,
    },

    /// default value {value} of '{owner}.{field}' is not a valid '{expected}'
    InvalidDefault {
        owner: String,
        field: String,
        value: String,
        expected: String,
    },

    /// invalid GraphQL name '{name}': {reason}
    InvalidName { name: String, reason: String },

    /// GraphQL name '{name}' is used by both '{first}' and '{second}'
    DuplicateTypeName {
        name: String,
        first: String,
        second: String,
    },

    /// '{owner}.{field}' is declared more than once
    DuplicateField { owner: String, field: String },

    /// '{type_name}' cannot be registered as {expected}
    UnexpectedTypeKind {
        type_name: String,
        expected: &'static str,
    },
}

/// All the declaration errors found by [`Engine::build`](crate::Engine::build).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .errors.iter().join("\n"))]
pub struct BuildErrors {
    errors: Vec<BuildError>,
}

impl BuildErrors {
    pub(crate) fn new(errors: Vec<BuildError>) -> Self {
        Self { errors }
    }

    /// Iterates over the collected errors, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildError> + '_ {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first error that was found.
    pub fn first(&self) -> Option<&BuildError> {
        self.errors.first()
    }
}

impl From<BuildError> for BuildErrors {
    fn from(error: BuildError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for BuildErrors {
    type Item = BuildError;
    type IntoIter = std::vec::IntoIter<BuildError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Failures while preparing a resolver call or reading its results.
///
/// Converted to a [`FieldError`] before reaching the execution engine.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvocationError {
    /// missing source value for '{type_name}'
    MissingSource { type_name: String },

    /// malformed value for '{type_name}': {reason}
    MalformedValue { type_name: String, reason: String },

    /// no '{type_name}' value in the request context
    MissingContextValue { type_name: String },

    /// could not encode result of type '{type_name}': {reason}
    ResultEncoding { type_name: String, reason: String },

    /// '{type_name}' cannot be used as {role}
    UnexpectedSlot {
        type_name: String,
        role: &'static str,
    },

    /// the resolver received {received} arguments but declares {expected}
    ArgumentCount { expected: usize, received: usize },
}

impl InvocationError {
    /// The `code` extension of the GraphQL error built from this error.
    pub fn extension_code(&self) -> &'static str {
        match self {
            InvocationError::MissingSource { .. } => "MISSING_SOURCE",
            InvocationError::MalformedValue { .. } => "MALFORMED_VALUE",
            InvocationError::MissingContextValue { .. } => "MISSING_CONTEXT_VALUE",
            InvocationError::ResultEncoding { .. } => "RESULT_ENCODING_ERROR",
            InvocationError::UnexpectedSlot { .. } => "UNEXPECTED_SLOT",
            InvocationError::ArgumentCount { .. } => "ARGUMENT_COUNT",
        }
    }

    /// Convert the invocation error to a GraphQL field error.
    pub fn to_field_error(&self) -> FieldError {
        let mut extensions = Object::new();
        match self {
            InvocationError::MissingSource { type_name }
            | InvocationError::MalformedValue { type_name, .. }
            | InvocationError::MissingContextValue { type_name }
            | InvocationError::ResultEncoding { type_name, .. }
            | InvocationError::UnexpectedSlot { type_name, .. } => {
                extensions.insert("type", type_name.clone().into());
            }
            InvocationError::ArgumentCount { .. } => {}
        }
        FieldError::builder()
            .message(self.to_string())
            .extension_code(self.extension_code())
            .extensions(extensions)
            .build()
    }
}

impl From<InvocationError> for FieldError {
    fn from(error: InvocationError) -> Self {
        error.to_field_error()
    }
}

/// A segment of the response path of a field error.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Key(String),
    /// An index in a list.
    Index(usize),
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors) reported for one field.
///
/// This is the error a resolver returns, and what the execution engine reports in the
/// `errors` entry of the response for that field.
#[derive(Error, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[error("{message}")]
#[non_exhaustive]
pub struct FieldError {
    /// The error message.
    pub message: String,

    /// The path to the field in the response, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl FieldError {
    /// Returns a builder that builds a [`FieldError`] from its components.
    ///
    /// `.extension_code()` sets the "code" in the extension map, unless the extensions
    /// already have one.
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        path: Option<Vec<PathSegment>>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(ByteString::from(code)));
        }
        Self {
            message,
            path,
            extensions,
        }
    }

    /// The `code` extension, if any.
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(|code| code.as_str())
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        FieldError::builder().message(message).build()
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        FieldError::builder().message(message.to_string()).build()
    }
}

/// Helper to print the Rust path of a type without its module prefix.
pub(crate) struct ShortTypeName<'a>(pub(crate) &'a str);

impl fmt::Display for ShortTypeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(index) = rest.find("::") {
            let (head, tail) = rest.split_at(index);
            rest = &tail[2..];
            if let Some(start) = head.rfind(['<', '(', ' ', ',']) {
                f.write_str(&head[..=start])?;
            }
        }
        f.write_str(rest)
    }
}
