//! SDL printing of the generated types.

use std::fmt;
use std::fmt::Write as _;

use super::ArgumentConfig;
use super::DefaultValue;
use super::EnumType;
use super::InputObjectType;
use super::ObjectType;
use super::ScalarType;
use super::SchemaType;
use super::TypeLookup;
use super::TypeRef;
use crate::json_ext::Value;

const INDENT: &str = "  ";

/// Prints `value` as a GraphQL literal of type `ty`.
///
/// Enum values are printed unquoted. The type of a nested input object field is looked
/// up in `types`; when it cannot be found, strings are printed quoted.
pub(crate) fn literal(value: &Value, ty: Option<&TypeRef>, types: &dyn TypeLookup) -> String {
    let mut out = String::new();
    write_literal(&mut out, value, ty, types);
    out
}

fn write_literal(out: &mut String, value: &Value, ty: Option<&TypeRef>, types: &dyn TypeLookup) {
    let ty = ty.map(nullable);
    let named = || ty.and_then(|ty| types.lookup(ty.inner_type_name()));
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => match named() {
            Some(SchemaType::Enum(_)) => out.push_str(s.as_str()),
            _ => write_string(out, s.as_str()),
        },
        Value::Array(items) => {
            let item_ty = match ty {
                Some(TypeRef::List(inner)) => Some(inner.as_ref()),
                other => other,
            };
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item, item_ty, types);
            }
            out.push(']');
        }
        Value::Object(object) => {
            let object_ty = named();
            let object_ty = object_ty.as_ref().and_then(SchemaType::as_input_object);
            out.push('{');
            for (index, (key, item)) in object.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(key.as_str());
                out.push_str(": ");
                let field_ty = object_ty
                    .and_then(|object_ty| object_ty.fields.get(key.as_str()))
                    .map(|field| &field.ty);
                write_literal(out, item, field_ty, types);
            }
            out.push('}');
        }
    }
}

fn nullable(ty: &TypeRef) -> &TypeRef {
    match ty {
        TypeRef::NonNull(inner) => inner,
        ty => ty,
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_description(
    f: &mut fmt::Formatter<'_>,
    description: Option<&str>,
    indent: &str,
) -> fmt::Result {
    match description {
        Some(description) if !description.is_empty() => writeln!(
            f,
            "{indent}\"\"\"{}\"\"\"",
            description.replace("\"\"\"", "\\\"\"\"")
        ),
        _ => Ok(()),
    }
}

fn write_default(f: &mut fmt::Formatter<'_>, default: Option<&DefaultValue>) -> fmt::Result {
    match default {
        Some(default) => write!(f, " = {}", default.literal),
        None => Ok(()),
    }
}

fn write_arguments<'a>(
    f: &mut fmt::Formatter<'_>,
    arguments: impl ExactSizeIterator<Item = &'a ArgumentConfig>,
) -> fmt::Result {
    if arguments.len() == 0 {
        return Ok(());
    }
    f.write_str("(")?;
    for (index, argument) in arguments.enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        if let Some(description) = argument.description.as_deref().filter(|d| !d.is_empty()) {
            write!(
                f,
                "\"\"\"{}\"\"\" ",
                description.replace("\"\"\"", "\\\"\"\"")
            )?;
        }
        write!(f, "{}: {}", argument.name, argument.ty)?;
        write_default(f, argument.default_value.as_ref())?;
    }
    f.write_str(")")
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_description(f, self.description.as_deref(), "")?;
        writeln!(f, "scalar {}", self.name)
    }
}

impl fmt::Display for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_description(f, self.description.as_deref(), "")?;
        writeln!(f, "enum {} {{", self.name)?;
        for value in self.values.values() {
            write_description(f, value.description.as_deref(), INDENT)?;
            writeln!(f, "{INDENT}{}", value.name)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for InputObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_description(f, self.description.as_deref(), "")?;
        writeln!(f, "input {} {{", self.name)?;
        for field in self.fields.values() {
            write_description(f, field.description.as_deref(), INDENT)?;
            write!(f, "{INDENT}{}: {}", field.name, field.ty)?;
            write_default(f, field.default_value.as_ref())?;
            writeln!(f)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_description(f, self.description.as_deref(), "")?;
        writeln!(f, "type {} {{", self.name)?;
        for field in self.fields.values() {
            write_description(f, field.description.as_deref(), INDENT)?;
            write!(f, "{INDENT}{}", field.name)?;
            write_arguments(f, field.arguments.values())?;
            writeln!(f, ": {}", field.ty)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Scalar(ty) => ty.fmt(f),
            SchemaType::Enum(ty) => ty.fmt(f),
            SchemaType::InputObject(ty) => ty.fmt(f),
            SchemaType::Object(ty) => ty.fmt(f),
        }
    }
}

/// Prints type definitions separated by a blank line.
pub(crate) fn print_definitions<'a>(definitions: impl IntoIterator<Item = &'a SchemaType>) -> String {
    let mut out = String::new();
    for definition in definitions {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{definition}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;
    use crate::schema::EnumValue;
    use crate::schema::InputField;
    use crate::schema::ObjectField;

    struct Types(Vec<SchemaType>);

    impl TypeLookup for Types {
        fn lookup(&self, name: &str) -> Option<SchemaType> {
            self.0.iter().find(|ty| ty.name() == name).cloned()
        }
    }

    fn color() -> SchemaType {
        let values = ["RED", "GREEN"]
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    EnumValue {
                        name: name.to_string(),
                        description: None,
                    },
                )
            })
            .collect();
        SchemaType::Enum(Arc::new(EnumType {
            name: "Color".to_string(),
            description: Some("A color".to_string()),
            values,
        }))
    }

    #[test]
    fn literals_follow_the_field_type() {
        let mut fields = IndexMap::new();
        fields.insert(
            "tint".to_string(),
            InputField {
                name: "tint".to_string(),
                description: None,
                ty: TypeRef::named("Color").non_null(),
                default_value: None,
            },
        );
        let style = SchemaType::InputObject(Arc::new(InputObjectType {
            name: "Style".to_string(),
            description: None,
            fields,
            parse_value: None,
        }));
        let types = Types(vec![color(), style]);

        assert_eq!(
            literal(
                &json!([{ "tint": "RED" }, null]),
                Some(&TypeRef::named("Style").list()),
                &types
            ),
            "[{tint: RED}, null]"
        );
        assert_eq!(
            literal(&json!("say \"hi\"\n"), Some(&TypeRef::String), &types),
            r#""say \"hi\"\n""#
        );
        assert_eq!(literal(&json!("RED"), None, &types), r#""RED""#);
    }

    #[test]
    fn definitions() {
        let mut fields = IndexMap::new();
        fields.insert(
            "posts".to_string(),
            ObjectField {
                name: "posts".to_string(),
                description: Some("Latest posts".to_string()),
                ty: TypeRef::String.non_null().list().non_null(),
                arguments: [(
                    "first".to_string(),
                    ArgumentConfig {
                        name: "first".to_string(),
                        description: None,
                        ty: TypeRef::Int.non_null(),
                        default_value: Some(DefaultValue {
                            value: json!(10),
                            literal: "10".to_string(),
                        }),
                    },
                )]
                .into_iter()
                .collect(),
                resolved: true,
            },
        );
        let user = SchemaType::Object(Arc::new(ObjectType {
            name: "User".to_string(),
            description: None,
            fields,
        }));

        assert_eq!(
            print_definitions(&[color(), user]),
            r#""""A color"""
enum Color {
  RED
  GREEN
}

type User {
  """Latest posts"""
  posts(first: Int! = 10): [String!]!
}
"#
        );
    }
}
