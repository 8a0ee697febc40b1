//! Resolver construction.
//!
//! A [`Handler`] is a closure whose parameters and return value describe themselves
//! through [`Reflect`]. The [`ResolverBuilder`] classifies them once, then wraps the
//! closure into a [`ResolveFn`] of the shape the execution engine expects.

use std::sync::Arc;

use derivative::Derivative;
use itertools::Itertools;

use crate::arguments::ArgumentBinder;
use crate::arguments::ArgumentSlot;
use crate::descriptor::Emitted;
use crate::descriptor::Reflect;
use crate::descriptor::ResolverReturn;
use crate::descriptor::SlotInput;
use crate::descriptor::TypeDescriptor;
use crate::error::BuildError;
use crate::error::InvocationError;
use crate::input::validate_name;
use crate::object::ObjectCollector;
use crate::resolve::ResolveFn;
use crate::resolve::ResolveParams;
use crate::resolve::Resolved;
use crate::result::FieldTarget;
use crate::result::OutputShape;
use crate::result::ResultDispatcher;
use crate::result::ResultSlot;
use crate::result::fold;
use crate::schema::FieldArguments;
use crate::schema::TypeRef;

/// A function that can be installed as a resolver.
///
/// Implemented for closures and functions of up to six parameters, each of which is
/// [`Reflect`], returning a [`ResolverReturn`].
pub trait Handler<Params, Output>: Clone + Send + Sync + 'static {
    /// The descriptors of the parameters, in order.
    fn parameters() -> Vec<TypeDescriptor>;

    /// The descriptors of the returned values, in order.
    fn results() -> Vec<TypeDescriptor>;

    /// Calls the handler with one input per parameter.
    fn call(&self, inputs: Vec<SlotInput<'_>>) -> Result<Vec<Emitted>, InvocationError>;
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_handler {
    ($($param:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, R, $($param,)*> Handler<($($param,)*), R> for F
        where
            F: Fn($($param),*) -> R + Clone + Send + Sync + 'static,
            R: ResolverReturn,
            $($param: Reflect,)*
        {
            fn parameters() -> Vec<TypeDescriptor> {
                vec![$(<$param as Reflect>::descriptor()),*]
            }

            fn results() -> Vec<TypeDescriptor> {
                R::descriptors()
            }

            fn call(&self, inputs: Vec<SlotInput<'_>>) -> Result<Vec<Emitted>, InvocationError> {
                let expected = count!($($param)*);
                let received = inputs.len();
                if received != expected {
                    return Err(InvocationError::ArgumentCount { expected, received });
                }
                let mut inputs = inputs.into_iter();
                $(
                    let $param = <$param as Reflect>::extract(
                        inputs
                            .next()
                            .ok_or(InvocationError::ArgumentCount { expected, received })?,
                    )?;
                )*
                Ok((self)($($param),*).emit_all())
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);

/// A built resolver.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Resolver {
    name: String,
    object: Option<String>,
    arguments: Vec<ArgumentSlot>,
    argument_config: FieldArguments,
    results: Vec<ResultSlot>,
    output: TypeRef,
    is_batch: bool,
    #[derivative(Debug = "ignore")]
    resolve: ResolveFn,
}

impl Resolver {
    /// The name of the root operation or of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object owning the field, `None` for root operations.
    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn arguments(&self) -> &[ArgumentSlot] {
        &self.arguments
    }

    /// The field arguments, from the arguments bundle parameter.
    pub fn argument_config(&self) -> &FieldArguments {
        &self.argument_config
    }

    pub fn results(&self) -> &[ResultSlot] {
        &self.results
    }

    /// The GraphQL type of the field.
    pub fn output(&self) -> &TypeRef {
        &self.output
    }

    /// Whether the source is a list of parents, resolved in one call.
    pub fn is_batch(&self) -> bool {
        self.is_batch
    }

    pub fn resolve(&self, params: ResolveParams) -> Resolved {
        (self.resolve)(params)
    }

    /// The resolution function to install in the execution engine.
    pub fn resolve_fn(&self) -> ResolveFn {
        self.resolve.clone()
    }
}

enum ResolverKind<'n> {
    Root { operation: &'n str },
    Field { field: &'n str },
}

pub(crate) struct ResolverBuilder<'c, 'a> {
    objects: &'c ObjectCollector<'a>,
}

impl<'c, 'a> ResolverBuilder<'c, 'a> {
    pub(crate) fn new(objects: &'c ObjectCollector<'a>) -> Self {
        Self { objects }
    }

    /// Builds the resolver of a root operation, which takes no source.
    pub(crate) fn root<H, P, R>(&self, operation: &str, handler: H) -> Result<Resolver, BuildError>
    where
        H: Handler<P, R>,
    {
        self.build(ResolverKind::Root { operation }, handler)
    }

    /// Builds the resolver of `field`, on the object its source parameter is.
    pub(crate) fn field<H, P, R>(&self, field: &str, handler: H) -> Result<Resolver, BuildError>
    where
        H: Handler<P, R>,
    {
        self.build(ResolverKind::Field { field }, handler)
    }

    fn build<H, P, R>(&self, kind: ResolverKind<'_>, handler: H) -> Result<Resolver, BuildError>
    where
        H: Handler<P, R>,
    {
        let bound = ArgumentBinder::new(&self.objects.inputs).bind(&H::parameters())?;

        let (name, object, target) = match kind {
            ResolverKind::Root { operation } => {
                if let Some(source) = &bound.source {
                    return Err(BuildError::UnexpectedSource {
                        operation: operation.to_string(),
                        type_name: source.to_string(),
                    });
                }
                validate_name(operation)?;
                (operation.to_string(), None, None)
            }
            ResolverKind::Field { field } => {
                let source = bound.source.as_ref().ok_or_else(|| BuildError::MissingSource {
                    field: field.to_string(),
                })?;
                let (name, object, target) = self.field_target(field, source, bound.is_batch)?;
                (name, Some(object), target)
            }
        };

        let dispatched = ResultDispatcher::new(self.objects).dispatch(
            &H::results(),
            bound.is_batch,
            target.as_ref(),
        )?;
        let output = dispatched
            .output
            .ok_or_else(|| BuildError::MissingResult {
                operation: name.clone(),
            })?;

        tracing::debug!(
            resolver = %name,
            object = object.as_deref().unwrap_or_default(),
            arguments = %bound.slots.iter().map(|slot| slot.role).join(", "),
            results = %dispatched.slots.iter().map(|slot| slot.role).join(", "),
            is_batch = bound.is_batch,
            output = %output,
            "built resolver"
        );

        let resolve = resolve_fn(
            name.clone(),
            handler,
            bound.slots.clone(),
            dispatched.slots.clone(),
            dispatched.shape,
        );
        Ok(Resolver {
            name,
            object,
            arguments: bound.slots,
            argument_config: bound.arguments,
            results: dispatched.slots,
            output,
            is_batch: bound.is_batch,
            resolve,
        })
    }

    /// The exposed field name, its object, and the declared field when there is one.
    ///
    /// A field that the object does not declare is added to it by the resolver.
    fn field_target(
        &self,
        field: &str,
        source: &TypeDescriptor,
        is_batch: bool,
    ) -> Result<(String, String, Option<FieldTarget>), BuildError> {
        let object_descriptor = if is_batch {
            source.element().unwrap_or_else(|| source.clone())
        } else {
            source.clone()
        };
        let object = match self.objects.output_type(&object_descriptor)? {
            Some(ty) => ty.inner_type_name().to_string(),
            None => {
                return Err(BuildError::UnexpectedTypeKind {
                    type_name: object_descriptor.to_string(),
                    expected: "an object",
                });
            }
        };

        let inputs = &self.objects.inputs;
        let mut declared = None;
        for decl in object_descriptor
            .capabilities()
            .map(|caps| caps.fields())
            .unwrap_or_default()
        {
            let exposed = inputs.exposed_name(&decl)?;
            if decl.name() == field || exposed == field {
                declared = Some((decl, exposed));
                break;
            }
        }

        match declared {
            Some((decl, exposed)) => {
                if !decl.resolved {
                    return Err(BuildError::FieldNotResolvable {
                        object,
                        field: exposed,
                    });
                }
                let target = FieldTarget {
                    object: object.clone(),
                    field: exposed.clone(),
                    descriptor: (decl.ty)(),
                };
                Ok((exposed, object, Some(target)))
            }
            None => {
                validate_name(field)?;
                Ok((field.to_string(), object, None))
            }
        }
    }
}

fn resolve_fn<H, P, R>(
    name: String,
    handler: H,
    arguments: Vec<ArgumentSlot>,
    results: Vec<ResultSlot>,
    shape: Option<OutputShape>,
) -> ResolveFn
where
    H: Handler<P, R>,
{
    Arc::new(move |params: ResolveParams| {
        tracing::trace!(resolver = %name, "resolving");
        let emitted = arguments
            .iter()
            .map(|slot| slot.binder.bind(&params))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|inputs| handler.call(inputs));
        match emitted {
            Ok(emitted) => {
                let mut resolved = fold(&results, emitted, params.context.clone());
                if let Some(shape) = &shape {
                    resolved.value = shape.apply(resolved.value);
                }
                resolved
            }
            Err(error) => {
                tracing::trace!(resolver = %name, %error, "could not call resolver");
                Resolved::error(error.to_field_error(), params.context.clone())
            }
        }
    })
}
