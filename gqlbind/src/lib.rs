//! Derives GraphQL input types, field arguments and resolvers from Rust declarations.
//!
//! Types describe themselves through [`Reflect`], usually with the [`reflect!`] macro,
//! and resolvers are plain closures whose parameters and results are such types. An
//! [`Engine`] collects the declarations and checks them once, when the [`Schema`] is
//! built; the resulting resolvers are then called by the execution engine.

#![warn(unreachable_pub)]

pub mod descriptor;
pub mod error;
pub mod json_ext;
pub mod schema;

mod arguments;
mod builtin;
mod configuration;
mod context;
mod engine;
mod input;
mod keys;
mod object;
mod registry;
mod request;
mod resolve;
mod resolver;
mod result;

pub use arguments::ArgumentRole;
pub use arguments::ArgumentSlot;
pub use builtin::Id;
pub use configuration::CyclePolicy;
pub use configuration::EngineOptions;
pub use configuration::ErrorMode;
pub use configuration::FieldNaming;
pub use context::Context;
pub use context::ContextValue;
pub use descriptor::Arguments;
pub use descriptor::Capabilities;
pub use descriptor::ContextPatch;
pub use descriptor::Emitted;
pub use descriptor::EnumInfo;
pub use descriptor::EnumValueDecl;
pub use descriptor::Enumeration;
pub use descriptor::FieldDecl;
pub use descriptor::Fields;
pub use descriptor::InputObject;
pub use descriptor::Object;
pub use descriptor::ParseInputFn;
pub use descriptor::Reflect;
pub use descriptor::ResolverReturn;
pub use descriptor::Scalar;
pub use descriptor::ScalarInfo;
pub use descriptor::SlotInput;
pub use descriptor::TypeDescriptor;
pub use descriptor::TypeKey;
pub use descriptor::TypeKind;
pub use descriptor::Wrapper;
pub use engine::Engine;
pub use engine::OperationType;
pub use engine::Schema;
pub use error::BuildError;
pub use error::BuildErrors;
pub use error::FieldError;
pub use error::InvocationError;
pub use registry::TypeRegistry;
pub use request::RequestOptions;
pub use resolve::ResolveFn;
pub use resolve::ResolveParams;
pub use resolve::Resolved;
pub use resolver::Handler;
pub use resolver::Resolver;
pub use result::ResultRole;
pub use result::ResultSlot;
