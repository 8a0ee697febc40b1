//! Classification of resolver results, and their folding into a [`Resolved`].

use crate::context::Context;
use crate::descriptor::Emitted;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::TypeKind;
use crate::descriptor::Wrapper;
use crate::error::BuildError;
use crate::error::FieldError;
use crate::json_ext::Value;
use crate::keys::FieldKeys;
use crate::object::ObjectCollector;
use crate::resolve::Resolved;
use crate::schema::TypeRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResultRole {
    Primary,
    ContextMutation,
    Error,
}

/// One returned value of a resolver.
#[derive(Clone, Debug)]
pub struct ResultSlot {
    pub position: usize,
    pub role: ResultRole,
    pub descriptor: TypeDescriptor,
}

/// The declared field a resolver fills.
#[derive(Clone, Debug)]
pub(crate) struct FieldTarget {
    pub(crate) object: String,
    pub(crate) field: String,
    pub(crate) descriptor: TypeDescriptor,
}

#[derive(Debug)]
pub(crate) struct ResultSlots {
    pub(crate) slots: Vec<ResultSlot>,
    /// The GraphQL type of the primary result, per source value for batch resolvers.
    pub(crate) output: Option<TypeRef>,
    pub(crate) shape: Option<OutputShape>,
}

/// Turns the serialized primary result into the value of the field.
#[derive(Clone, Debug)]
pub(crate) struct OutputShape {
    keys: FieldKeys,
    /// Set when a batch resolver of a list field returns one element per source value.
    wrap_elements: bool,
}

impl OutputShape {
    pub(crate) fn apply(&self, value: Value) -> Value {
        match self.keys.to_exposed(value) {
            Value::Array(values) if self.wrap_elements => Value::Array(
                values
                    .into_iter()
                    .map(|value| {
                        if value.is_null() {
                            value
                        } else {
                            Value::Array(vec![value])
                        }
                    })
                    .collect(),
            ),
            value => value,
        }
    }
}

pub(crate) struct ResultDispatcher<'c, 'a> {
    objects: &'c ObjectCollector<'a>,
}

impl<'c, 'a> ResultDispatcher<'c, 'a> {
    pub(crate) fn new(objects: &'c ObjectCollector<'a>) -> Self {
        Self { objects }
    }

    /// Classifies `results`, in order.
    pub(crate) fn dispatch(
        &self,
        results: &[TypeDescriptor],
        is_batch: bool,
        target: Option<&FieldTarget>,
    ) -> Result<ResultSlots, BuildError> {
        let mut slots = Vec::with_capacity(results.len());
        let mut output = None;
        let mut shape = None;
        for (position, descriptor) in results.iter().enumerate() {
            let role = if is_context_merger(descriptor) {
                ResultRole::ContextMutation
            } else if is_error(descriptor) {
                ResultRole::Error
            } else {
                let type_name = || descriptor.to_string();
                let checked = if is_batch {
                    descriptor
                        .element()
                        .ok_or_else(|| BuildError::ExpectedSequenceResult {
                            position,
                            type_name: type_name(),
                        })?
                } else {
                    descriptor.clone()
                };
                let mut wrap_elements = false;
                if let Some(target) = target {
                    if !check_result_type(&target.descriptor, &checked) {
                        wrap_elements = is_batch
                            && list_element(&target.descriptor)
                                .is_some_and(|element| check_result_type(&element, &checked));
                        if !wrap_elements {
                            return Err(BuildError::ResultTypeMismatch {
                                object: target.object.clone(),
                                field: target.field.clone(),
                                expected: target.descriptor.to_string(),
                                actual: checked.to_string(),
                            });
                        }
                    }
                }
                let shaped = match target {
                    Some(target) if wrap_elements => &target.descriptor,
                    _ => &checked,
                };
                let ty = self.objects.output_type(shaped)?.ok_or_else(|| {
                    BuildError::UnsupportedResultType {
                        position,
                        type_name: type_name(),
                    }
                })?;
                if output.is_some() {
                    return Err(BuildError::MultipleResults {
                        position,
                        type_name: type_name(),
                    });
                }
                output = Some(ty);
                shape = Some(OutputShape {
                    keys: FieldKeys::new(descriptor.clone(), self.objects.inputs.naming),
                    wrap_elements,
                });
                ResultRole::Primary
            };
            slots.push(ResultSlot {
                position,
                role,
                descriptor: descriptor.clone(),
            });
        }
        Ok(ResultSlots {
            slots,
            output,
            shape,
        })
    }
}

fn is_context_merger(descriptor: &TypeDescriptor) -> bool {
    let mergeable = match descriptor.kind() {
        TypeKind::Context => true,
        TypeKind::Composite(info) => info.caps.context_value,
        _ => false,
    };
    mergeable && at_most_optional(descriptor)
}

fn is_error(descriptor: &TypeDescriptor) -> bool {
    matches!(descriptor.kind(), TypeKind::Error) && at_most_optional(descriptor)
}

fn at_most_optional(descriptor: &TypeDescriptor) -> bool {
    descriptor.is_wrapped_by(&[]) || descriptor.is_wrapped_by(&[Wrapper::Optional])
}

/// The element type of a list, one `Option` around the list ignored.
fn list_element(descriptor: &TypeDescriptor) -> Option<TypeDescriptor> {
    if descriptor.outer() == Some(Wrapper::Optional) {
        descriptor.strip_outer().element()
    } else {
        descriptor.element()
    }
}

/// Whether a result of type `actual` can fill a field declared as `expected`.
///
/// Both must be lists or neither; one `Option` is ignored around each side and around
/// list elements. What remains must be the same type.
pub(crate) fn check_result_type(expected: &TypeDescriptor, actual: &TypeDescriptor) -> bool {
    fn unwrap(descriptor: &TypeDescriptor) -> (bool, TypeDescriptor) {
        let mut descriptor = descriptor.clone();
        if descriptor.outer() == Some(Wrapper::Optional) {
            descriptor = descriptor.strip_outer();
        }
        let is_list = descriptor.outer() == Some(Wrapper::List);
        if is_list {
            descriptor = descriptor.strip_outer();
            if descriptor.outer() == Some(Wrapper::Optional) {
                descriptor = descriptor.strip_outer();
            }
        }
        (is_list, descriptor)
    }

    let (expected_list, expected) = unwrap(expected);
    let (actual_list, actual) = unwrap(actual);
    expected_list == actual_list
        && expected.key() == actual.key()
        && expected.wrappers().eq(actual.wrappers())
}

/// Folds the emitted values of a call into a [`Resolved`].
///
/// Context mutations apply in order. The first error wins, in which case the value is
/// dropped and the original context is kept.
pub(crate) fn fold(slots: &[ResultSlot], emitted: Vec<Emitted>, context: Context) -> Resolved {
    let original = context.clone();
    let mut context = context;
    let mut value = Value::Null;
    let mut error: Option<FieldError> = None;
    let mut mutations = 0;

    for (slot, emitted) in slots.iter().zip(emitted) {
        match (slot.role, emitted) {
            (_, Emitted::Invalid(invalid)) => {
                if error.is_none() {
                    error = Some(invalid.to_field_error());
                }
            }
            (ResultRole::Primary, Emitted::Value(primary)) => value = primary,
            (ResultRole::ContextMutation, Emitted::Context(Some(patch))) => {
                mutations += 1;
                if mutations > 1 {
                    tracing::trace!(
                        position = slot.position,
                        "context mutation folded over a previous one"
                    );
                }
                context = patch.apply(context);
            }
            (ResultRole::Error, Emitted::Error(Some(returned))) => {
                if error.is_none() {
                    error = Some(returned);
                }
            }
            _ => {}
        }
    }

    match error {
        Some(error) => Resolved::error(error, original),
        None => Resolved::value(value, context),
    }
}
