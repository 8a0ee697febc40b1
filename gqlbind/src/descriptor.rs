//! Static description of Rust types.
//!
//! Types taking part in a schema implement [`Reflect`], usually through the [`reflect!`]
//! macro. A [`TypeDescriptor`] tells the engine the identity of a type, how it is
//! wrapped (`Option`, `Vec`) and which capabilities its base type declares.

use std::any::TypeId;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::configuration::FieldNaming;
use crate::context::Context;
use crate::context::ContextValue;
use crate::error::FieldError;
use crate::error::InvocationError;
use crate::error::ShortTypeName;
use crate::json_ext::Object as JsonObject;
use crate::json_ext::Value;
use crate::schema::ParseValueFn;
use crate::schema::TypeRef;

/// A type that can appear in a schema or in a resolver signature.
pub trait Reflect: Sized + Send + 'static {
    /// Describes the type.
    fn descriptor() -> TypeDescriptor;

    /// Builds a parameter value from what a binder produced.
    fn extract(input: SlotInput<'_>) -> Result<Self, InvocationError>;

    /// Turns a returned value into something the result dispatcher understands.
    fn emit(self) -> Emitted;

    /// What a `None` of this type is emitted as.
    #[doc(hidden)]
    fn emit_none() -> Emitted {
        Emitted::Value(Value::Null)
    }
}

/// Identity of a base type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The full Rust path of the type.
    pub fn rust_name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrapper {
    Optional,
    List,
}

/// A type with its wrapping and the kind of its base type.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    key: TypeKey,
    /// Outermost first, with the Rust name of the wrapped type at that layer.
    wrappers: Vec<(Wrapper, &'static str)>,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Describes the unwrapped type `T`.
    pub fn base<T: 'static>(kind: TypeKind) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            wrappers: Vec::new(),
            kind,
        }
    }

    /// Describes the composite type `T`, named after the last segment of its path.
    pub fn composite<T: 'static>(caps: Capabilities) -> Self {
        Self::base::<T>(TypeKind::Composite(CompositeInfo {
            name: short_name(std::any::type_name::<T>()).to_string(),
            caps,
        }))
    }

    /// Adds an outermost wrapping layer; `rust_name` names the wrapped type.
    #[must_use]
    pub fn wrap(mut self, wrapper: Wrapper, rust_name: &'static str) -> Self {
        self.wrappers.insert(0, (wrapper, rust_name));
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn wrappers(&self) -> impl DoubleEndedIterator<Item = Wrapper> + ExactSizeIterator + '_ {
        self.wrappers.iter().map(|(wrapper, _)| *wrapper)
    }

    pub fn rust_name(&self) -> &'static str {
        self.wrappers
            .first()
            .map_or(self.key.name, |(_, rust_name)| *rust_name)
    }

    /// Whether a reference to this type goes through `Option` or `Vec`.
    pub fn has_indirection(&self) -> bool {
        !self.wrappers.is_empty()
    }

    pub(crate) fn is_wrapped_by(&self, wrappers: &[Wrapper]) -> bool {
        self.wrappers().eq(wrappers.iter().copied())
    }

    /// The element type, if this is a list.
    pub fn element(&self) -> Option<TypeDescriptor> {
        match self.wrappers.first() {
            Some((Wrapper::List, _)) => Some(self.strip_outer()),
            _ => None,
        }
    }

    pub(crate) fn strip_outer(&self) -> TypeDescriptor {
        Self {
            key: self.key,
            wrappers: self.wrappers.iter().skip(1).copied().collect(),
            kind: self.kind.clone(),
        }
    }

    pub(crate) fn outer(&self) -> Option<Wrapper> {
        self.wrappers.first().map(|(wrapper, _)| *wrapper)
    }

    /// Applies the wrapping to the GraphQL type of the base type: `T` is non-null,
    /// `Option<T>` is nullable and `Vec<T>` is a non-null list.
    pub(crate) fn graphql_type(&self, base: TypeRef) -> TypeRef {
        let mut ty = base;
        let mut nullable = false;
        for wrapper in self.wrappers().rev() {
            match wrapper {
                Wrapper::Optional => nullable = true,
                Wrapper::List => {
                    if !nullable {
                        ty = ty.non_null();
                    }
                    ty = ty.list();
                    nullable = false;
                }
            }
        }
        if nullable { ty } else { ty.non_null() }
    }

    pub(crate) fn capabilities(&self) -> Option<&Capabilities> {
        match &self.kind {
            TypeKind::Composite(info) => Some(&info.caps),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ShortTypeName(self.rust_name()).fmt(f)
    }
}

/// The name of a type without its module path nor generic parameters.
pub(crate) fn short_name(rust_name: &str) -> &str {
    let name = rust_name.split('<').next().unwrap_or(rust_name);
    name.rsplit("::").next().unwrap_or(name)
}

#[derive(Clone, Debug)]
pub enum TypeKind {
    Scalar(ScalarInfo),
    Enum(EnumInfo),
    Composite(CompositeInfo),
    /// The request [`Context`] itself.
    Context,
    /// [`FieldError`].
    Error,
}

#[derive(Clone, Debug)]
pub struct ScalarInfo {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) builtin: bool,
}

impl ScalarInfo {
    pub(crate) fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            builtin: true,
        }
    }

    pub fn custom<T: Scalar>() -> Self {
        Self {
            name: T::name().to_string(),
            description: T::description().map(str::to_string),
            builtin: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnumInfo {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) values: fn() -> Vec<EnumValueDecl>,
}

impl EnumInfo {
    pub fn of<T: Enumeration>() -> Self {
        Self {
            name: short_name(std::any::type_name::<T>()).to_string(),
            description: T::description().map(str::to_string),
            values: T::values as fn() -> Vec<EnumValueDecl>,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompositeInfo {
    pub(crate) name: String,
    pub(crate) caps: Capabilities,
}

/// The closed set of capabilities a composite type may declare.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    pub(crate) fields: Option<fn() -> Vec<FieldDecl>>,
    pub(crate) input: Option<fn() -> InputPrototype>,
    pub(crate) arguments: bool,
    pub(crate) object: Option<ObjectCapability>,
    pub(crate) context_value: bool,
}

impl Capabilities {
    /// The type is an input object.
    pub fn input<T: InputObject>(mut self) -> Self {
        self.fields = Some(T::fields as fn() -> Vec<FieldDecl>);
        self.input = Some(InputPrototype::of::<T> as fn() -> InputPrototype);
        self
    }

    /// The fields of the type can be used as the arguments of a field.
    pub fn arguments<T: Arguments>(mut self) -> Self {
        self.fields = Some(T::fields as fn() -> Vec<FieldDecl>);
        self.arguments = true;
        self
    }

    /// The type is an output object, and can be the source of field resolvers.
    pub fn object<T: Object>(mut self) -> Self {
        self.fields = Some(T::fields as fn() -> Vec<FieldDecl>);
        self.object = Some(ObjectCapability {
            description: T::description(),
        });
        self
    }

    #[doc(hidden)]
    pub fn context_value<T: ContextValue>(mut self) -> Self {
        self.context_value = true;
        self
    }

    pub(crate) fn fields(&self) -> Vec<FieldDecl> {
        self.fields.map(|fields| fields()).unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct ObjectCapability {
    pub(crate) description: Option<&'static str>,
}

/// The declaration of a field of a composite type.
///
/// The declared name is the key the field has in the serialized value, so it must
/// match what serde uses for that field.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub(crate) name: &'static str,
    pub(crate) rename: Option<&'static str>,
    pub(crate) description: Option<&'static str>,
    pub(crate) default: Option<&'static str>,
    pub(crate) resolved: bool,
    pub(crate) ty: fn() -> TypeDescriptor,
}

impl FieldDecl {
    pub fn new<T: Reflect>(name: &'static str) -> Self {
        Self {
            name,
            rename: None,
            description: None,
            default: None,
            resolved: false,
            ty: T::descriptor as fn() -> TypeDescriptor,
        }
    }

    /// Exposes the field under `name` instead of its declared name.
    pub fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Sets the default value, as JSON text.
    pub fn default_value(mut self, json: &'static str) -> Self {
        self.default = Some(json);
        self
    }

    /// Marks the field as filled by a field resolver.
    pub fn resolved(mut self) -> Self {
        self.resolved = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name the field is exposed under: its rename, or its declared name after
    /// `naming`.
    pub(crate) fn exposed_name(&self, naming: FieldNaming) -> String {
        self.rename
            .map_or_else(|| naming.expose(self.name), str::to_string)
    }
}

/// Types with declared fields.
pub trait Fields {
    fn fields() -> Vec<FieldDecl>;
}

/// A custom input parser: builds the value from the coerced input object.
pub type ParseInputFn<T> = fn(&JsonObject) -> Result<T, FieldError>;

/// Types usable as input objects.
///
/// `input_name` and `parse_value` are optional capabilities, probed on `T::default()`.
pub trait InputObject:
    Fields + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn description(&self) -> Option<&str> {
        None
    }

    /// Overrides the name of the input type.
    fn input_name(&self) -> Option<&str> {
        None
    }

    /// A parser used instead of building the value field by field.
    fn parse_value(&self) -> Option<ParseInputFn<Self>> {
        None
    }
}

/// Types whose fields are the arguments of a field.
pub trait Arguments: Fields + Serialize + DeserializeOwned + Send + 'static {}

/// Output object types.
pub trait Object: Fields + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn description() -> Option<&'static str> {
        None
    }
}

/// Enumerations, serialized by serde as their value names.
pub trait Enumeration: Serialize + DeserializeOwned + Send + 'static {
    fn values() -> Vec<EnumValueDecl>;

    fn description() -> Option<&'static str> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValueDecl {
    pub(crate) name: &'static str,
    pub(crate) description: Option<&'static str>,
}

impl EnumValueDecl {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            description: None,
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Custom scalars.
pub trait Scalar: Serialize + DeserializeOwned + Send + 'static {
    fn name() -> &'static str;

    fn description() -> Option<&'static str> {
        None
    }
}

/// What the probe of an input type's optional capabilities found.
#[derive(Clone)]
pub struct InputPrototype {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) parse_value: Option<ParseValueFn>,
}

impl InputPrototype {
    fn of<T: InputObject>() -> Self {
        let prototype = T::default();
        let parse_value = prototype.parse_value().map(|parse| {
            Arc::new(move |object: &JsonObject| {
                let parsed = parse(object)?;
                serde_json_bytes::to_value(parsed).map_err(|err| {
                    InvocationError::ResultEncoding {
                        type_name: ShortTypeName(std::any::type_name::<T>()).to_string(),
                        reason: err.to_string(),
                    }
                    .to_field_error()
                })
            }) as ParseValueFn
        });
        Self {
            name: prototype.input_name().map(str::to_string),
            description: prototype.description().map(str::to_string),
            parse_value,
        }
    }
}

impl fmt::Debug for InputPrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPrototype")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parse_value", &self.parse_value.is_some())
            .finish()
    }
}

/// What a binder hands to [`Reflect::extract`].
#[derive(Debug)]
pub enum SlotInput<'a> {
    Value(Value),
    Context(&'a Context),
}

/// A returned value, as seen by the result dispatcher.
#[derive(Debug)]
pub enum Emitted {
    Value(Value),
    Context(Option<ContextPatch>),
    Error(Option<FieldError>),
    /// The value could not be emitted.
    Invalid(InvocationError),
    /// No value, because the resolver failed.
    Absent,
}

/// A change to the request context returned by a resolver.
pub struct ContextPatch(Box<dyn FnOnce(Context) -> Context + Send>);

impl ContextPatch {
    /// Stores `value` in the context.
    pub fn insert<T: ContextValue>(value: T) -> Self {
        Self(Box::new(move |context: Context| context.with(value)))
    }

    /// Merges `other` into the context.
    pub fn merge(other: Context) -> Self {
        Self(Box::new(move |context: Context| context.merge(&other)))
    }

    pub(crate) fn apply(self, context: Context) -> Context {
        (self.0)(context)
    }
}

impl fmt::Debug for ContextPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextPatch")
    }
}

/// The return type of a resolver: a single value, a tuple of values or a `Result`.
pub trait ResolverReturn: Send + 'static {
    fn descriptors() -> Vec<TypeDescriptor>;

    fn emit_all(self) -> Vec<Emitted>;
}

#[doc(hidden)]
pub fn extract_json<T: DeserializeOwned>(input: SlotInput<'_>) -> Result<T, InvocationError> {
    match input {
        SlotInput::Value(value) => {
            serde_json_bytes::from_value(value).map_err(|err| InvocationError::MalformedValue {
                type_name: ShortTypeName(std::any::type_name::<T>()).to_string(),
                reason: err.to_string(),
            })
        }
        SlotInput::Context(_) => Err(InvocationError::UnexpectedSlot {
            type_name: ShortTypeName(std::any::type_name::<T>()).to_string(),
            role: "a context value",
        }),
    }
}

#[doc(hidden)]
pub fn emit_json<T: Serialize>(value: T) -> Emitted {
    match serde_json_bytes::to_value(value) {
        Ok(value) => Emitted::Value(value),
        Err(err) => Emitted::Invalid(InvocationError::ResultEncoding {
            type_name: ShortTypeName(std::any::type_name::<T>()).to_string(),
            reason: err.to_string(),
        }),
    }
}

#[doc(hidden)]
pub fn extract_context<T: ContextValue>(input: SlotInput<'_>) -> Result<T, InvocationError> {
    let type_name = || ShortTypeName(std::any::type_name::<T>()).to_string();
    match input {
        SlotInput::Context(context) => context
            .get::<T>()
            .ok_or_else(|| InvocationError::MissingContextValue {
                type_name: type_name(),
            }),
        SlotInput::Value(_) => Err(InvocationError::UnexpectedSlot {
            type_name: type_name(),
            role: "a field value",
        }),
    }
}

/// Implements [`Reflect`] for a type declaring its capabilities.
///
/// ```ignore
/// reflect!(User: object);
/// reflect!(UserFilter: input, arguments);
/// reflect!(Session: context);
/// reflect!(Color: enumeration);
/// reflect!(Timestamp: scalar);
/// ```
#[macro_export]
macro_rules! reflect {
    ($ty:ty: context) => {
        impl $crate::Reflect for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::composite::<Self>(
                    $crate::Capabilities::default().context_value::<Self>(),
                )
            }

            fn extract(
                input: $crate::SlotInput<'_>,
            ) -> ::std::result::Result<Self, $crate::InvocationError> {
                $crate::descriptor::extract_context(input)
            }

            fn emit(self) -> $crate::Emitted {
                $crate::Emitted::Context(::std::option::Option::Some(
                    $crate::ContextPatch::insert(self),
                ))
            }

            fn emit_none() -> $crate::Emitted {
                $crate::Emitted::Context(::std::option::Option::None)
            }
        }

        $crate::__single_return!($ty);
    };
    ($ty:ty: enumeration) => {
        impl $crate::Reflect for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::base::<Self>($crate::TypeKind::Enum(
                    $crate::EnumInfo::of::<Self>(),
                ))
            }

            fn extract(
                input: $crate::SlotInput<'_>,
            ) -> ::std::result::Result<Self, $crate::InvocationError> {
                $crate::descriptor::extract_json(input)
            }

            fn emit(self) -> $crate::Emitted {
                $crate::descriptor::emit_json(self)
            }
        }

        $crate::__single_return!($ty);
    };
    ($ty:ty: scalar) => {
        impl $crate::Reflect for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::base::<Self>($crate::TypeKind::Scalar(
                    $crate::ScalarInfo::custom::<Self>(),
                ))
            }

            fn extract(
                input: $crate::SlotInput<'_>,
            ) -> ::std::result::Result<Self, $crate::InvocationError> {
                $crate::descriptor::extract_json(input)
            }

            fn emit(self) -> $crate::Emitted {
                $crate::descriptor::emit_json(self)
            }
        }

        $crate::__single_return!($ty);
    };
    ($ty:ty: $($cap:ident),+ $(,)?) => {
        impl $crate::Reflect for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::composite::<Self>(
                    $crate::Capabilities::default()$(.$cap::<Self>())+,
                )
            }

            fn extract(
                input: $crate::SlotInput<'_>,
            ) -> ::std::result::Result<Self, $crate::InvocationError> {
                $crate::descriptor::extract_json(input)
            }

            fn emit(self) -> $crate::Emitted {
                $crate::descriptor::emit_json(self)
            }
        }

        $crate::__single_return!($ty);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __single_return {
    ($ty:ty) => {
        impl $crate::ResolverReturn for $ty {
            fn descriptors() -> ::std::vec::Vec<$crate::TypeDescriptor> {
                ::std::vec![<Self as $crate::Reflect>::descriptor()]
            }

            fn emit_all(self) -> ::std::vec::Vec<$crate::Emitted> {
                ::std::vec![$crate::Reflect::emit(self)]
            }
        }
    };
}
