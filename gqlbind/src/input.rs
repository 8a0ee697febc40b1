//! Input object collection.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::configuration::FieldNaming;
use crate::descriptor::CompositeInfo;
use crate::descriptor::FieldDecl;
use crate::descriptor::InputPrototype;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::TypeKind;
use crate::error::BuildError;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::keys::FieldKeys;
use crate::registry::Ensured;
use crate::registry::TypeRegistry;
use crate::schema::DefaultValue;
use crate::schema::EnumType;
use crate::schema::EnumValue;
use crate::schema::InputField;
use crate::schema::InputObjectType;
use crate::schema::ParseValueFn;
use crate::schema::ScalarType;
use crate::schema::SchemaType;
use crate::schema::TypeRef;
use crate::schema::literal;

/// Recognizes one category of base type, returning `None` when not applicable.
type InputChecker = fn(&InputCollector<'_>, &TypeDescriptor) -> Result<Option<TypeRef>, BuildError>;

const INPUT_CHECKERS: &[InputChecker] = &[
    |_, descriptor| Ok(builtin_scalar(descriptor)),
    |collector, descriptor| custom_scalar(collector.registry, descriptor),
    |collector, descriptor| enumeration(collector.registry, descriptor),
    |collector, descriptor| collector.input_object(descriptor),
];

/// Builds input object types and the input types of fields and arguments.
pub(crate) struct InputCollector<'a> {
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) naming: FieldNaming,
}

impl<'a> InputCollector<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry, naming: FieldNaming) -> Self {
        Self { registry, naming }
    }

    /// The GraphQL input type of `descriptor`, or `None` when it cannot be an input.
    pub(crate) fn input_type(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<TypeRef>, BuildError> {
        for check in INPUT_CHECKERS {
            if let Some(base) = check(self, descriptor)? {
                return Ok(Some(descriptor.graphql_type(base)));
            }
        }
        Ok(None)
    }

    /// Like [`Self::input_type`], failing on types that cannot be an input.
    pub(crate) fn field_input_type(
        &self,
        owner: &str,
        decl: &FieldDecl,
        context: &'static str,
    ) -> Result<TypeRef, BuildError> {
        let descriptor = (decl.ty)();
        self.input_type(&descriptor)?
            .ok_or_else(|| BuildError::UnsupportedFieldType {
                owner: owner.to_string(),
                field: decl.name.to_string(),
                type_name: descriptor.to_string(),
                context,
            })
    }

    fn input_object(&self, descriptor: &TypeDescriptor) -> Result<Option<TypeRef>, BuildError> {
        let TypeKind::Composite(info) = descriptor.kind() else {
            return Ok(None);
        };
        let Some(prototype) = info.caps.input.map(|probe| probe()) else {
            return Ok(None);
        };
        let name = prototype.name.clone().unwrap_or_else(|| info.name.clone());
        let ensured = self.registry.ensure(descriptor, &name, || {
            validate_name(&name)?;
            self.collect_input(&name, descriptor, info, prototype)
        })?;
        match &ensured {
            Ensured::Built(SchemaType::InputObject(_)) | Ensured::Pending { .. } => {
                Ok(Some(TypeRef::named(ensured.name())))
            }
            Ensured::Built(_) => Err(BuildError::UnexpectedTypeKind {
                type_name: descriptor.to_string(),
                expected: "an input object",
            }),
        }
    }

    fn collect_input(
        &self,
        name: &str,
        descriptor: &TypeDescriptor,
        info: &CompositeInfo,
        prototype: InputPrototype,
    ) -> Result<SchemaType, BuildError> {
        let mut fields = IndexMap::new();
        for decl in info.caps.fields() {
            let exposed = self.exposed_name(&decl)?;
            let ty = self.field_input_type(name, &decl, "input field")?;
            let default_value = self.default_value(name, &decl, &ty)?;
            if fields.contains_key(&exposed) {
                return Err(BuildError::DuplicateField {
                    owner: name.to_string(),
                    field: exposed,
                });
            }
            fields.insert(
                exposed.clone(),
                InputField {
                    name: exposed,
                    description: decl.description.map(str::to_string),
                    ty,
                    default_value,
                },
            );
        }
        Ok(SchemaType::InputObject(Arc::new(InputObjectType {
            name: name.to_string(),
            description: prototype.description,
            fields,
            parse_value: prototype.parse_value.map(|parse| {
                rekeyed_parser(parse, FieldKeys::new(descriptor.clone(), self.naming))
            }),
        })))
    }

    /// The name `decl` is exposed under: its rename, or its declared name after the
    /// naming policy.
    pub(crate) fn exposed_name(&self, decl: &FieldDecl) -> Result<String, BuildError> {
        let name = decl.exposed_name(self.naming);
        validate_name(&name)?;
        Ok(name)
    }

    /// Parses and checks the default value of `decl`.
    pub(crate) fn default_value(
        &self,
        owner: &str,
        decl: &FieldDecl,
        ty: &TypeRef,
    ) -> Result<Option<DefaultValue>, BuildError> {
        let Some(text) = decl.default else {
            return Ok(None);
        };
        let value: Value =
            serde_json::from_str(text).map_err(|err| BuildError::MalformedDefault {
                owner: owner.to_string(),
                field: decl.name.to_string(),
                reason: err.to_string(),
            })?;
        ty.validate_input_value(&value, self.registry)
            .map_err(|_| BuildError::InvalidDefault {
                owner: owner.to_string(),
                field: decl.name.to_string(),
                value: text.to_string(),
                expected: ty.to_string(),
            })?;
        let literal = literal(&value, Some(ty), self.registry);
        Ok(Some(DefaultValue { value, literal }))
    }
}

/// Hands a custom parser declared keys, and exposes the keys of what it returns.
fn rekeyed_parser(parse: ParseValueFn, keys: FieldKeys) -> ParseValueFn {
    Arc::new(move |object: &Object| {
        let declared = match keys.to_declared(Value::Object(object.clone())) {
            Value::Object(declared) => declared,
            _ => object.clone(),
        };
        parse(&declared).map(|value| keys.to_exposed(value))
    })
}

pub(crate) fn validate_name(name: &str) -> Result<(), BuildError> {
    apollo_compiler::Name::new(name)
        .map(|_| ())
        .map_err(|err| BuildError::InvalidName {
            name: name.to_string(),
            reason: err.to_string(),
        })
}

pub(crate) fn builtin_scalar(descriptor: &TypeDescriptor) -> Option<TypeRef> {
    match descriptor.kind() {
        TypeKind::Scalar(info) if info.builtin => Some(TypeRef::named(&info.name)),
        _ => None,
    }
}

pub(crate) fn custom_scalar(
    registry: &TypeRegistry,
    descriptor: &TypeDescriptor,
) -> Result<Option<TypeRef>, BuildError> {
    let TypeKind::Scalar(info) = descriptor.kind() else {
        return Ok(None);
    };
    if info.builtin {
        return Ok(None);
    }
    let ensured = registry.ensure(descriptor, &info.name, || {
        validate_name(&info.name)?;
        Ok(SchemaType::Scalar(Arc::new(ScalarType {
            name: info.name.clone(),
            description: info.description.clone(),
        })))
    })?;
    Ok(Some(TypeRef::named(ensured.name())))
}

pub(crate) fn enumeration(
    registry: &TypeRegistry,
    descriptor: &TypeDescriptor,
) -> Result<Option<TypeRef>, BuildError> {
    let TypeKind::Enum(info) = descriptor.kind() else {
        return Ok(None);
    };
    let ensured = registry.ensure(descriptor, &info.name, || {
        validate_name(&info.name)?;
        let mut values = IndexMap::new();
        for value in (info.values)() {
            validate_name(value.name)?;
            let previous = values.insert(
                value.name.to_string(),
                EnumValue {
                    name: value.name.to_string(),
                    description: value.description.map(str::to_string),
                },
            );
            if previous.is_some() {
                return Err(BuildError::DuplicateField {
                    owner: info.name.clone(),
                    field: value.name.to_string(),
                });
            }
        }
        Ok(SchemaType::Enum(Arc::new(EnumType {
            name: info.name.clone(),
            description: info.description.clone(),
            values,
        })))
    })?;
    Ok(Some(TypeRef::named(ensured.name())))
}
