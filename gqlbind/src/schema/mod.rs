//! The GraphQL type system the engine produces values for.
//!
//! These are the schema primitives handed to the execution engine: scalars, enums,
//! input objects, objects, and the field-argument configuration of object fields.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

mod field_type;
mod sdl;

use std::sync::Arc;

use derivative::Derivative;
pub(crate) use field_type::InvalidValue;
pub use field_type::TypeRef;
use indexmap::IndexMap;
pub(crate) use sdl::literal;
pub(crate) use sdl::print_definitions;

use crate::error::FieldError;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// Custom value parser of an input object: turns the coerced raw object into the value
/// handed to resolvers.
pub type ParseValueFn = Arc<dyn Fn(&Object) -> Result<Value, FieldError> + Send + Sync>;

/// Resolves type names to schema types.
pub(crate) trait TypeLookup {
    fn lookup(&self, name: &str) -> Option<SchemaType>;
}

/// A named schema type.
#[derive(Debug, Clone)]
pub enum SchemaType {
    Scalar(Arc<ScalarType>),
    Enum(Arc<EnumType>),
    InputObject(Arc<InputObjectType>),
    Object(Arc<ObjectType>),
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Scalar(ty) => &ty.name,
            SchemaType::Enum(ty) => &ty.name,
            SchemaType::InputObject(ty) => &ty.name,
            SchemaType::Object(ty) => &ty.name,
        }
    }

    pub fn as_input_object(&self) -> Option<&Arc<InputObjectType>> {
        match self {
            SchemaType::InputObject(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectType>> {
        match self {
            SchemaType::Object(ty) => Some(ty),
            _ => None,
        }
    }
}

/// A custom scalar. Built-in scalars are not represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
}

/// A default value, kept both as JSON and as the GraphQL literal printed in SDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue {
    pub value: Value,
    pub literal: String,
}

/// A field of an input object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<DefaultValue>,
}

/// An input object type.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    /// Fields, in declaration order.
    pub fields: IndexMap<String, InputField>,
    #[derivative(Debug = "ignore")]
    pub parse_value: Option<ParseValueFn>,
}

impl InputObjectType {
    pub fn has_custom_parser(&self) -> bool {
        self.parse_value.is_some()
    }

    pub(crate) fn validate_object(
        &self,
        object: &Object,
        types: &dyn TypeLookup,
    ) -> Result<(), InvalidValue> {
        if object
            .keys()
            .any(|key| !self.fields.contains_key(key.as_str()))
        {
            return Err(InvalidValue);
        }
        self.fields.values().try_for_each(|field| {
            match object.get(field.name.as_str()) {
                Some(value) => field.ty.validate_input_value(value, types),
                None if field.default_value.is_some() || !field.ty.is_non_null() => Ok(()),
                None => Err(InvalidValue),
            }
        })
    }
}

/// A field argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentConfig {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<DefaultValue>,
}

/// The arguments of a field, keyed by argument name, in declaration order.
pub type FieldArguments = IndexMap<String, ArgumentConfig>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectField {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: FieldArguments,
    /// Whether a resolver fills this field.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, ObjectField>,
}

/// Coerces `value` to `ty` following the GraphQL input coercion rules: defaults of
/// missing input object fields are applied and custom input parsers are run.
pub(crate) fn coerce_input(
    ty: &TypeRef,
    value: &Value,
    types: &dyn TypeLookup,
) -> Result<Value, FieldError> {
    match (ty, value) {
        (TypeRef::NonNull(_), Value::Null) => Err(invalid_input(ty, value)),
        (TypeRef::NonNull(inner), value) => coerce_input(inner, value, types),
        (_, Value::Null) => Ok(Value::Null),
        (TypeRef::List(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_input(inner, item, types))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (TypeRef::List(inner), single) => {
            Ok(Value::Array(vec![coerce_input(inner, single, types)?]))
        }
        (TypeRef::Named(name), value) => match types.lookup(name) {
            Some(SchemaType::InputObject(object_ty)) => match value {
                Value::Object(object) => object_ty.coerce(object, types),
                _ => Err(invalid_input(ty, value)),
            },
            Some(_) => ty
                .validate_input_value(value, types)
                .map(|()| value.clone())
                .map_err(|_| invalid_input(ty, value)),
            None => Err(FieldError::builder()
                .message(format!("unknown type '{name}'"))
                .extension_code("UNKNOWN_TYPE")
                .build()),
        },
        (builtin, value) => builtin
            .validate_input_value(value, types)
            .map(|()| value.clone())
            .map_err(|_| invalid_input(ty, value)),
    }
}

impl InputObjectType {
    fn coerce(&self, object: &Object, types: &dyn TypeLookup) -> Result<Value, FieldError> {
        if let Some(unknown) = object
            .keys()
            .find(|key| !self.fields.contains_key(key.as_str()))
        {
            return Err(FieldError::builder()
                .message(format!(
                    "field '{}' is not defined by type '{}'",
                    unknown.as_str(),
                    self.name
                ))
                .extension_code("INVALID_INPUT")
                .build());
        }
        let mut coerced = Object::new();
        for field in self.fields.values() {
            let value = match (object.get(field.name.as_str()), &field.default_value) {
                (Some(value), _) => coerce_input(&field.ty, value, types)?,
                (None, Some(default)) => default.value.clone(),
                (None, None) if field.ty.is_non_null() => {
                    return Err(FieldError::builder()
                        .message(format!(
                            "missing required field '{}' of type '{}'",
                            field.name, self.name
                        ))
                        .extension_code("INVALID_INPUT")
                        .build());
                }
                (None, None) => continue,
            };
            coerced.insert(field.name.clone(), value);
        }
        match &self.parse_value {
            Some(parse_value) => parse_value(&coerced),
            None => Ok(Value::Object(coerced)),
        }
    }
}

fn invalid_input(ty: &TypeRef, value: &Value) -> FieldError {
    FieldError::builder()
        .message(format!("invalid value {value} for type '{ty}'"))
        .extension_code("INVALID_INPUT")
        .build()
}
