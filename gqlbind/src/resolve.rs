//! The field resolution contract of the execution engine.

use std::sync::Arc;

use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;

use crate::context::Context;
use crate::error::FieldError;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// What the execution engine hands to a resolver.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct ResolveParams {
    /// The request context.
    pub context: Context,
    /// The coerced field arguments.
    pub args: Object,
    /// The parent value, or the list of parent values of a batch resolver.
    pub source: Value,
}

#[buildstructor::buildstructor]
impl ResolveParams {
    #[builder(visibility = "pub")]
    fn new(
        context: Option<Context>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        args: JsonMap<ByteString, Value>,
        source: Option<Value>,
    ) -> Self {
        Self {
            context: context.unwrap_or_default(),
            args,
            source: source.unwrap_or_default(),
        }
    }
}

/// What a resolver hands back to the execution engine.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct Resolved {
    /// The field value; `null` when resolution failed.
    pub value: Value,
    /// The context seen by the resolvers of child fields.
    pub context: Context,
    pub error: Option<FieldError>,
}

impl Resolved {
    pub(crate) fn value(value: Value, context: Context) -> Self {
        Self {
            value,
            context,
            error: None,
        }
    }

    pub(crate) fn error(error: FieldError, context: Context) -> Self {
        Self {
            value: Value::Null,
            context,
            error: Some(error),
        }
    }

    /// The value, or the error of a failed resolution.
    pub fn into_result(self) -> Result<Value, FieldError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value),
        }
    }
}

/// A resolution function, shaped as the execution engine expects it.
pub type ResolveFn = Arc<dyn Fn(ResolveParams) -> Resolved + Send + Sync>;
