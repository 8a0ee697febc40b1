//! [`Reflect`] implementations of built-in scalars, wrappers and resolution types.

use serde::Deserialize;
use serde::Serialize;

use crate::context::Context;
use crate::descriptor::ContextPatch;
use crate::descriptor::Emitted;
use crate::descriptor::Reflect;
use crate::descriptor::ResolverReturn;
use crate::descriptor::ScalarInfo;
use crate::descriptor::SlotInput;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::TypeKind;
use crate::descriptor::Wrapper;
use crate::descriptor::emit_json;
use crate::descriptor::extract_json;
use crate::error::FieldError;
use crate::error::InvocationError;
use crate::error::ShortTypeName;
use crate::json_ext::Value;

/// The GraphQL `ID` scalar. Serialized as a string; integers are accepted on input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct Id(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    String(String),
    Int(i64),
}

impl From<RawId> for Id {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::String(id) => Id(id),
            RawId::Int(id) => Id(id.to_string()),
        }
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Id(id.to_string())
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! builtin_scalar {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::base::<Self>(TypeKind::Scalar(ScalarInfo::builtin($name)))
                }

                fn extract(input: SlotInput<'_>) -> Result<Self, InvocationError> {
                    extract_json(input)
                }

                fn emit(self) -> Emitted {
                    emit_json(self)
                }
            }

            crate::__single_return!($ty);
        )+
    };
}

builtin_scalar!(
    bool => "Boolean",
    i8 => "Int",
    i16 => "Int",
    i32 => "Int",
    u8 => "Int",
    u16 => "Int",
    f32 => "Float",
    f64 => "Float",
    String => "String",
    Id => "ID",
);

impl<T: Reflect> Reflect for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor().wrap(Wrapper::Optional, std::any::type_name::<Self>())
    }

    fn extract(input: SlotInput<'_>) -> Result<Self, InvocationError> {
        match input {
            SlotInput::Value(Value::Null) => Ok(None),
            SlotInput::Value(value) => T::extract(SlotInput::Value(value)).map(Some),
            SlotInput::Context(context) => Ok(T::extract(SlotInput::Context(context)).ok()),
        }
    }

    fn emit(self) -> Emitted {
        match self {
            Some(value) => value.emit(),
            None => T::emit_none(),
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor().wrap(Wrapper::List, std::any::type_name::<Self>())
    }

    fn extract(input: SlotInput<'_>) -> Result<Self, InvocationError> {
        let type_name = || ShortTypeName(std::any::type_name::<Self>()).to_string();
        match input {
            SlotInput::Value(Value::Array(items)) => items
                .into_iter()
                .map(|item| T::extract(SlotInput::Value(item)))
                .collect(),
            SlotInput::Value(value) => Err(InvocationError::MalformedValue {
                type_name: type_name(),
                reason: format!("expected a list, found {value}"),
            }),
            SlotInput::Context(_) => Err(InvocationError::UnexpectedSlot {
                type_name: type_name(),
                role: "a context value",
            }),
        }
    }

    fn emit(self) -> Emitted {
        let mut items = Vec::with_capacity(self.len());
        for item in self {
            match item.emit() {
                Emitted::Value(value) => items.push(value),
                Emitted::Invalid(error) => return Emitted::Invalid(error),
                _ => {
                    return Emitted::Invalid(InvocationError::UnexpectedSlot {
                        type_name: ShortTypeName(std::any::type_name::<Self>()).to_string(),
                        role: "a list item",
                    });
                }
            }
        }
        Emitted::Value(Value::Array(items))
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn extract(input: SlotInput<'_>) -> Result<Self, InvocationError> {
        T::extract(input).map(Box::new)
    }

    fn emit(self) -> Emitted {
        (*self).emit()
    }

    fn emit_none() -> Emitted {
        T::emit_none()
    }
}

impl Reflect for Context {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::base::<Self>(TypeKind::Context)
    }

    fn extract(input: SlotInput<'_>) -> Result<Self, InvocationError> {
        match input {
            SlotInput::Context(context) => Ok(context.clone()),
            SlotInput::Value(_) => Err(InvocationError::UnexpectedSlot {
                type_name: "Context".to_string(),
                role: "a field value",
            }),
        }
    }

    fn emit(self) -> Emitted {
        Emitted::Context(Some(ContextPatch::merge(self)))
    }

    fn emit_none() -> Emitted {
        Emitted::Context(None)
    }
}

impl Reflect for FieldError {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::base::<Self>(TypeKind::Error)
    }

    fn extract(_input: SlotInput<'_>) -> Result<Self, InvocationError> {
        Err(InvocationError::UnexpectedSlot {
            type_name: "FieldError".to_string(),
            role: "a parameter",
        })
    }

    fn emit(self) -> Emitted {
        Emitted::Error(Some(self))
    }

    fn emit_none() -> Emitted {
        Emitted::Error(None)
    }
}

crate::__single_return!(Context);
crate::__single_return!(FieldError);

impl<T: Reflect> ResolverReturn for Option<T> {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![Self::descriptor()]
    }

    fn emit_all(self) -> Vec<Emitted> {
        vec![self.emit()]
    }
}

impl<T: Reflect> ResolverReturn for Vec<T> {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![Self::descriptor()]
    }

    fn emit_all(self) -> Vec<Emitted> {
        vec![self.emit()]
    }
}

impl<T: Reflect> ResolverReturn for Box<T> {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![Self::descriptor()]
    }

    fn emit_all(self) -> Vec<Emitted> {
        vec![self.emit()]
    }
}

impl ResolverReturn for () {
    fn descriptors() -> Vec<TypeDescriptor> {
        Vec::new()
    }

    fn emit_all(self) -> Vec<Emitted> {
        Vec::new()
    }
}

/// `Ok` emits the values of `R` and no error; `Err` emits no value and the error.
impl<R, E> ResolverReturn for Result<R, E>
where
    R: ResolverReturn,
    E: Into<FieldError> + Send + 'static,
{
    fn descriptors() -> Vec<TypeDescriptor> {
        let mut descriptors = R::descriptors();
        descriptors.push(<Option<FieldError>>::descriptor());
        descriptors
    }

    fn emit_all(self) -> Vec<Emitted> {
        match self {
            Ok(values) => {
                let mut emitted = values.emit_all();
                emitted.push(Emitted::Error(None));
                emitted
            }
            Err(error) => {
                let mut emitted: Vec<_> = R::descriptors().iter().map(|_| Emitted::Absent).collect();
                emitted.push(Emitted::Error(Some(error.into())));
                emitted
            }
        }
    }
}

macro_rules! tuple_return {
    ($($name:ident),+) => {
        impl<$($name: Reflect),+> ResolverReturn for ($($name,)+) {
            fn descriptors() -> Vec<TypeDescriptor> {
                vec![$($name::descriptor()),+]
            }

            #[allow(non_snake_case)]
            fn emit_all(self) -> Vec<Emitted> {
                let ($($name,)+) = self;
                vec![$($name.emit()),+]
            }
        }
    };
}

tuple_return!(A);
tuple_return!(A, B);
tuple_return!(A, B, C);
tuple_return!(A, B, C, D);
