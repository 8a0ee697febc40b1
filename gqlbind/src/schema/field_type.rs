use serde::Deserialize;
use serde::Serialize;

use super::SchemaType;
use super::TypeLookup;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;

#[derive(Debug)]
pub(crate) struct InvalidValue;

/// A reference to a schema type, as written in a field or argument definition.
// Primitives are taken from scalars: https://spec.graphql.org/draft/#sec-Scalars
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// Named type {0}
    Named(String),
    /// List type {0}
    List(Box<TypeRef>),
    /// Non null type {0}
    NonNull(Box<TypeRef>),
    /// String
    String,
    /// Int
    Int,
    /// Float
    Float,
    /// Id
    Id,
    /// Boolean
    Boolean,
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Named(ty) => write!(f, "{ty}"),
            TypeRef::List(ty) => write!(f, "[{ty}]"),
            TypeRef::NonNull(ty) => write!(f, "{ty}!"),
            TypeRef::String => write!(f, "String"),
            TypeRef::Int => write!(f, "Int"),
            TypeRef::Float => write!(f, "Float"),
            TypeRef::Id => write!(f, "ID"),
            TypeRef::Boolean => write!(f, "Boolean"),
        }
    }
}

impl TypeRef {
    /// A reference to the type called `name`, mapping built-in scalar names to their variant.
    pub fn named(name: &str) -> Self {
        match name {
            "String" => Self::String,
            "Int" => Self::Int,
            "Float" => Self::Float,
            "ID" => Self::Id,
            "Boolean" => Self::Boolean,
            _ => Self::Named(name.to_string()),
        }
    }

    pub(crate) fn non_null(self) -> Self {
        match self {
            non_null @ TypeRef::NonNull(_) => non_null,
            nullable => TypeRef::NonNull(Box::new(nullable)),
        }
    }

    pub(crate) fn list(self) -> Self {
        TypeRef::List(Box::new(self))
    }

    // This function validates input values according to the graphql specification.
    // Each of the values are validated against the "input coercion" rules.
    pub(crate) fn validate_input_value(
        &self,
        value: &Value,
        types: &dyn TypeLookup,
    ) -> Result<(), InvalidValue> {
        match (self, value) {
            (TypeRef::String, Value::String(_)) => Ok(()),
            // Spec: https://spec.graphql.org/June2018/#sec-Int
            (TypeRef::Int, maybe_int) => {
                if maybe_int == &Value::Null || maybe_int.is_valid_int_input() {
                    Ok(())
                } else {
                    Err(InvalidValue)
                }
            }
            // Spec: https://spec.graphql.org/draft/#sec-Float.Input-Coercion
            (TypeRef::Float, maybe_float) => {
                if maybe_float == &Value::Null || maybe_float.is_valid_float_input() {
                    Ok(())
                } else {
                    Err(InvalidValue)
                }
            }
            // The ID type is serialized in the same way as a String, integers are accepted
            // on input.
            (TypeRef::Id, Value::String(_)) => Ok(()),
            (TypeRef::Id, maybe_int) => {
                if maybe_int == &Value::Null || maybe_int.is_valid_int_input() {
                    Ok(())
                } else {
                    Err(InvalidValue)
                }
            }
            (TypeRef::Boolean, Value::Bool(_)) => Ok(()),
            (TypeRef::List(inner_ty), Value::Array(vec)) => vec
                .iter()
                .try_for_each(|x| inner_ty.validate_input_value(x, types)),
            // For coercion from single value to list
            (TypeRef::List(inner_ty), val) if val != &Value::Null => {
                inner_ty.validate_input_value(val, types)
            }
            (TypeRef::NonNull(inner_ty), value) => {
                if value.is_null() {
                    Err(InvalidValue)
                } else {
                    inner_ty.validate_input_value(value, types)
                }
            }
            // NOTE: graphql's types are all optional by default
            (_, Value::Null) => Ok(()),
            (TypeRef::Named(name), value) => match types.lookup(name) {
                Some(SchemaType::Scalar(_)) => Ok(()),
                Some(SchemaType::Enum(enum_ty)) => value
                    .as_str()
                    .filter(|name| enum_ty.values.contains_key(*name))
                    .map(|_| ())
                    .ok_or(InvalidValue),
                Some(SchemaType::InputObject(object_ty)) => value
                    .as_object()
                    .ok_or(InvalidValue)
                    .and_then(|object| object_ty.validate_object(object, types)),
                Some(SchemaType::Object(_)) => Err(InvalidValue),
                // still under construction: checked again once the schema is built
                None => Ok(()),
            },
            _ => Err(InvalidValue),
        }
    }

    /// return the name of the type on which selections happen
    ///
    /// Example if we get the field `list: [User!]!`, it will return "User"
    pub fn inner_type_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name.as_str(),
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.inner_type_name(),
            TypeRef::String => "String",
            TypeRef::Int => "Int",
            TypeRef::Float => "Float",
            TypeRef::Id => "ID",
            TypeRef::Boolean => "Boolean",
        }
    }

    pub fn is_builtin_scalar(&self) -> bool {
        match self {
            TypeRef::Named(_) | TypeRef::List(_) | TypeRef::NonNull(_) => false,
            TypeRef::String | TypeRef::Int | TypeRef::Float | TypeRef::Id | TypeRef::Boolean => {
                true
            }
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}
