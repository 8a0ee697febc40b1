//! Output object collection.
//!
//! Objects are collected so that resolver results and sources can be recognized and so
//! that the fields filled by resolvers can be matched against their declaration.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::descriptor::CompositeInfo;
use crate::descriptor::ObjectCapability;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::TypeKind;
use crate::error::BuildError;
use crate::input::InputCollector;
use crate::input::builtin_scalar;
use crate::input::custom_scalar;
use crate::input::enumeration;
use crate::input::validate_name;
use crate::registry::Ensured;
use crate::schema::FieldArguments;
use crate::schema::ObjectField;
use crate::schema::ObjectType;
use crate::schema::SchemaType;
use crate::schema::TypeRef;

type OutputChecker =
    fn(&ObjectCollector<'_>, &TypeDescriptor) -> Result<Option<TypeRef>, BuildError>;

const OUTPUT_CHECKERS: &[OutputChecker] = &[
    |_, descriptor| Ok(builtin_scalar(descriptor)),
    |collector, descriptor| custom_scalar(collector.inputs.registry, descriptor),
    |collector, descriptor| enumeration(collector.inputs.registry, descriptor),
    |collector, descriptor| collector.object(descriptor),
];

/// Builds object types and the output types of fields and resolver results.
pub(crate) struct ObjectCollector<'a> {
    pub(crate) inputs: InputCollector<'a>,
}

impl<'a> ObjectCollector<'a> {
    pub(crate) fn new(inputs: InputCollector<'a>) -> Self {
        Self { inputs }
    }

    /// The GraphQL output type of `descriptor`, or `None` when it cannot be an output.
    pub(crate) fn output_type(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<TypeRef>, BuildError> {
        for check in OUTPUT_CHECKERS {
            if let Some(base) = check(self, descriptor)? {
                return Ok(Some(descriptor.graphql_type(base)));
            }
        }
        Ok(None)
    }

    fn object(&self, descriptor: &TypeDescriptor) -> Result<Option<TypeRef>, BuildError> {
        let TypeKind::Composite(info) = descriptor.kind() else {
            return Ok(None);
        };
        let Some(capability) = &info.caps.object else {
            return Ok(None);
        };
        let ensured = self.inputs.registry.ensure(descriptor, &info.name, || {
            validate_name(&info.name)?;
            self.collect_object(info, capability)
        })?;
        match &ensured {
            Ensured::Built(SchemaType::Object(_)) | Ensured::Pending { .. } => {
                Ok(Some(TypeRef::named(ensured.name())))
            }
            Ensured::Built(_) => Err(BuildError::UnexpectedTypeKind {
                type_name: descriptor.to_string(),
                expected: "an object",
            }),
        }
    }

    fn collect_object(
        &self,
        info: &CompositeInfo,
        capability: &ObjectCapability,
    ) -> Result<SchemaType, BuildError> {
        let mut fields = IndexMap::new();
        for decl in info.caps.fields() {
            let exposed = self.inputs.exposed_name(&decl)?;
            let descriptor = (decl.ty)();
            let ty = self.output_type(&descriptor)?.ok_or_else(|| {
                BuildError::UnsupportedFieldType {
                    owner: info.name.clone(),
                    field: decl.name.to_string(),
                    type_name: descriptor.to_string(),
                    context: "object field",
                }
            })?;
            if fields.contains_key(&exposed) {
                return Err(BuildError::DuplicateField {
                    owner: info.name.clone(),
                    field: exposed,
                });
            }
            fields.insert(
                exposed.clone(),
                ObjectField {
                    name: exposed,
                    description: decl.description.map(str::to_string),
                    ty,
                    arguments: FieldArguments::new(),
                    resolved: decl.resolved,
                },
            );
        }
        Ok(SchemaType::Object(Arc::new(ObjectType {
            name: info.name.clone(),
            description: capability.description.map(str::to_string),
            fields,
        })))
    }
}
