//! Classification of resolver parameters.
//!
//! Every parameter of a resolver is one of: the field arguments bundle, a value read
//! from the request context, or the source object. Each gets a [`Binder`] producing its
//! value from the [`ResolveParams`] of a call.

use crate::descriptor::Capabilities;
use crate::descriptor::SlotInput;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::TypeKind;
use crate::descriptor::Wrapper;
use crate::error::BuildError;
use crate::error::InvocationError;
use crate::input::InputCollector;
use crate::keys::FieldKeys;
use crate::json_ext::Value;
use crate::resolve::ResolveParams;
use crate::schema::ArgumentConfig;
use crate::schema::FieldArguments;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ArgumentRole {
    Arguments,
    Context,
    Source,
}

/// One parameter of a resolver.
#[derive(Clone, Debug)]
pub struct ArgumentSlot {
    pub position: usize,
    pub role: ArgumentRole,
    pub descriptor: TypeDescriptor,
    pub(crate) binder: Binder,
}

/// Produces the value of a parameter for one call.
///
/// Arguments are expected as coerced by [`Schema::coerce_arguments`](crate::Schema::coerce_arguments):
/// only missing top-level arguments are filled here, from their default values.
#[derive(Clone, Debug)]
pub(crate) enum Binder {
    Context,
    Arguments {
        defaults: Vec<(String, Value)>,
        keys: FieldKeys,
    },
    Source {
        type_name: String,
        keys: FieldKeys,
    },
}

impl Binder {
    pub(crate) fn bind<'p>(
        &self,
        params: &'p ResolveParams,
    ) -> Result<SlotInput<'p>, InvocationError> {
        match self {
            Binder::Context => Ok(SlotInput::Context(&params.context)),
            Binder::Arguments { defaults, keys } => {
                let mut args = params.args.clone();
                for (name, value) in defaults {
                    if !args.contains_key(name.as_str()) {
                        args.insert(name.clone(), value.clone());
                    }
                }
                Ok(SlotInput::Value(keys.to_declared(Value::Object(args))))
            }
            Binder::Source { type_name, keys } => {
                if params.source.is_null() {
                    Err(InvocationError::MissingSource {
                        type_name: type_name.clone(),
                    })
                } else {
                    Ok(SlotInput::Value(keys.to_declared(params.source.clone())))
                }
            }
        }
    }
}

/// The classified parameters of a resolver.
#[derive(Debug, Default)]
pub(crate) struct BoundArguments {
    pub(crate) slots: Vec<ArgumentSlot>,
    pub(crate) arguments: FieldArguments,
    pub(crate) source: Option<TypeDescriptor>,
    pub(crate) is_batch: bool,
}

pub(crate) struct ArgumentBinder<'c, 'a> {
    inputs: &'c InputCollector<'a>,
}

impl<'c, 'a> ArgumentBinder<'c, 'a> {
    pub(crate) fn new(inputs: &'c InputCollector<'a>) -> Self {
        Self { inputs }
    }

    /// Classifies `parameters`, in order.
    pub(crate) fn bind(&self, parameters: &[TypeDescriptor]) -> Result<BoundArguments, BuildError> {
        let mut bound = BoundArguments::default();
        let mut has_bundle = false;
        for (position, descriptor) in parameters.iter().enumerate() {
            let type_name = || descriptor.to_string();
            let (role, binder) = if let Some(caps) = arguments_bundle(descriptor) {
                if has_bundle {
                    return Err(BuildError::MultipleArgumentBundles {
                        position,
                        type_name: type_name(),
                    });
                }
                has_bundle = true;
                let (arguments, defaults) = self.field_arguments(descriptor, caps)?;
                bound.arguments = arguments;
                (
                    ArgumentRole::Arguments,
                    Binder::Arguments {
                        defaults,
                        keys: self.keys(descriptor),
                    },
                )
            } else if is_context(descriptor) {
                (ArgumentRole::Context, Binder::Context)
            } else if let Some(is_batch) = source_object(descriptor) {
                if bound.source.is_some() {
                    return Err(BuildError::MultipleSources {
                        position,
                        type_name: type_name(),
                    });
                }
                bound.source = Some(descriptor.clone());
                bound.is_batch = is_batch;
                (
                    ArgumentRole::Source,
                    Binder::Source {
                        type_name: type_name(),
                        keys: self.keys(descriptor),
                    },
                )
            } else {
                return Err(BuildError::UnsupportedArgumentType {
                    position,
                    type_name: type_name(),
                });
            };
            bound.slots.push(ArgumentSlot {
                position,
                role,
                descriptor: descriptor.clone(),
                binder,
            });
        }
        Ok(bound)
    }

    fn keys(&self, descriptor: &TypeDescriptor) -> FieldKeys {
        FieldKeys::new(descriptor.clone(), self.inputs.naming)
    }

    fn field_arguments(
        &self,
        descriptor: &TypeDescriptor,
        caps: &Capabilities,
    ) -> Result<(FieldArguments, Vec<(String, Value)>), BuildError> {
        let owner = descriptor.to_string();
        let mut arguments = FieldArguments::new();
        let mut defaults = Vec::new();
        for decl in caps.fields() {
            let name = self.inputs.exposed_name(&decl)?;
            let ty = self.inputs.field_input_type(&owner, &decl, "argument")?;
            let default_value = self.inputs.default_value(&owner, &decl, &ty)?;
            if arguments.contains_key(&name) {
                return Err(BuildError::DuplicateField { owner, field: name });
            }
            if let Some(default) = &default_value {
                defaults.push((name.clone(), default.value.clone()));
            }
            arguments.insert(
                name.clone(),
                ArgumentConfig {
                    name,
                    description: decl.description.map(str::to_string),
                    ty,
                    default_value,
                },
            );
        }
        Ok((arguments, defaults))
    }
}

fn arguments_bundle(descriptor: &TypeDescriptor) -> Option<&Capabilities> {
    descriptor
        .capabilities()
        .filter(|caps| caps.arguments && !descriptor.has_indirection())
}

/// The request context, or a value stored in it.
fn is_context(descriptor: &TypeDescriptor) -> bool {
    let context_kind = match descriptor.kind() {
        TypeKind::Context => true,
        TypeKind::Composite(info) => info.caps.context_value,
        _ => false,
    };
    context_kind && (descriptor.is_wrapped_by(&[]) || descriptor.is_wrapped_by(&[Wrapper::Optional]))
}

/// `Some(is_batch)` when the parameter is an object or a list of objects.
fn source_object(descriptor: &TypeDescriptor) -> Option<bool> {
    descriptor.capabilities()?.object.as_ref()?;
    if descriptor.is_wrapped_by(&[]) {
        Some(false)
    } else if descriptor.is_wrapped_by(&[Wrapper::List]) {
        Some(true)
    } else {
        None
    }
}
