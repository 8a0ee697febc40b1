//! Schema construction entry point.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::configuration::EngineOptions;
use crate::configuration::ErrorMode;
use crate::descriptor::Reflect;
use crate::descriptor::TypeDescriptor;
use crate::error::BuildError;
use crate::error::BuildErrors;
use crate::error::FieldError;
use crate::input::InputCollector;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::object::ObjectCollector;
use crate::registry::TypeRegistry;
use crate::resolve::ResolveParams;
use crate::resolve::Resolved;
use crate::resolver::Handler;
use crate::resolver::Resolver;
use crate::resolver::ResolverBuilder;
use crate::schema;
use crate::schema::FieldArguments;
use crate::schema::InputObjectType;
use crate::schema::ObjectField;
use crate::schema::ObjectType;
use crate::schema::SchemaType;
use crate::schema::TypeLookup;
use crate::schema::TypeRef;

/// A root operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum OperationType {
    Query,
    Mutation,
}

/// Collects type and resolver declarations, then builds a [`Schema`] from them.
///
/// Declarations are checked as they are made. Errors are kept until [`Engine::build`],
/// which reports them; with [`ErrorMode::FailFast`] the declarations following the first
/// error are ignored.
#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    registry: TypeRegistry,
    queries: IndexMap<String, Resolver>,
    mutations: IndexMap<String, Resolver>,
    /// Field resolvers, by object then field.
    fields: IndexMap<String, IndexMap<String, Resolver>>,
    errors: Vec<BuildError>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            registry: TypeRegistry::new(options.cycles),
            options,
            queries: IndexMap::new(),
            mutations: IndexMap::new(),
            fields: IndexMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The types registered so far.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Registers `T` as an input type, along with the types it refers to.
    pub fn register_input<T: Reflect>(&mut self) -> &mut Self {
        if self.is_halted() {
            return self;
        }
        let descriptor = T::descriptor();
        let result = self
            .inputs()
            .input_type(&descriptor)
            .and_then(|ty| expect_type(ty, &descriptor, "an input type"));
        self.record(result)
    }

    /// Registers `T` as an output type, along with the types it refers to.
    pub fn register_object<T: Reflect>(&mut self) -> &mut Self {
        if self.is_halted() {
            return self;
        }
        let descriptor = T::descriptor();
        let result = ObjectCollector::new(self.inputs())
            .output_type(&descriptor)
            .and_then(|ty| expect_type(ty, &descriptor, "an output type"));
        self.record(result)
    }

    /// Declares the root query field `name`, resolved by `handler`.
    pub fn query<H, P, R>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Handler<P, R>,
    {
        self.root(OperationType::Query, name, handler)
    }

    /// Declares the root mutation field `name`, resolved by `handler`.
    pub fn mutation<H, P, R>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Handler<P, R>,
    {
        self.root(OperationType::Mutation, name, handler)
    }

    /// Declares the resolver of field `name` on the object `handler` takes as its source.
    pub fn field<H, P, R>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: Handler<P, R>,
    {
        if self.is_halted() {
            return self;
        }
        let result = self
            .with_resolvers(|builder| builder.field(name, handler))
            .and_then(|resolver| {
                let object = resolver.object().unwrap_or_default().to_string();
                let fields = self.fields.entry(object.clone()).or_default();
                if fields.contains_key(resolver.name()) {
                    return Err(BuildError::DuplicateField {
                        owner: object,
                        field: resolver.name().to_string(),
                    });
                }
                fields.insert(resolver.name().to_string(), resolver);
                Ok(())
            });
        self.record(result)
    }

    fn root<H, P, R>(&mut self, operation: OperationType, name: &str, handler: H) -> &mut Self
    where
        H: Handler<P, R>,
    {
        if self.is_halted() {
            return self;
        }
        let result = self
            .with_resolvers(|builder| builder.root(name, handler))
            .and_then(|resolver| {
                let resolvers = match operation {
                    OperationType::Query => &mut self.queries,
                    OperationType::Mutation => &mut self.mutations,
                };
                if resolvers.contains_key(resolver.name()) {
                    return Err(BuildError::DuplicateField {
                        owner: operation.to_string(),
                        field: resolver.name().to_string(),
                    });
                }
                resolvers.insert(resolver.name().to_string(), resolver);
                Ok(())
            });
        self.record(result)
    }

    /// Builds the schema, or reports the declaration errors.
    ///
    /// Types are listed after the root operation types, in order of first registration.
    pub fn build(&self) -> Result<Schema, BuildErrors> {
        if !self.errors.is_empty() {
            return Err(BuildErrors::new(self.errors.clone()));
        }

        let mut errors = Vec::new();
        let mut types = IndexMap::new();
        for (operation, resolvers) in [
            (OperationType::Query, &self.queries),
            (OperationType::Mutation, &self.mutations),
        ] {
            let Some(root) = root_type(operation, resolvers) else {
                continue;
            };
            if let Some(rust_name) = self.registry.rust_name(&root.name) {
                errors.push(BuildError::DuplicateTypeName {
                    name: root.name.clone(),
                    first: rust_name.to_string(),
                    second: format!("the {} root type", root.name),
                });
                continue;
            }
            types.insert(root.name.clone(), SchemaType::Object(Arc::new(root)));
        }
        if !errors.is_empty() {
            return Err(self.failure(errors));
        }

        types.extend(
            self.registry
                .types()
                .into_iter()
                .map(|ty| (ty.name().to_string(), ty)),
        );
        let errors = check_defaults(&types);
        if !errors.is_empty() {
            return Err(self.failure(errors));
        }
        for resolver in self.fields.values().flat_map(IndexMap::values) {
            let Some(SchemaType::Object(object)) = resolver.object().and_then(|o| types.get(o))
            else {
                continue;
            };
            let object = with_resolved_field(object, resolver);
            types.insert(object.name.clone(), SchemaType::Object(Arc::new(object)));
        }

        tracing::debug!(
            types = types.len(),
            queries = self.queries.len(),
            mutations = self.mutations.len(),
            "built schema"
        );
        Ok(Schema {
            types,
            queries: self.queries.clone(),
            mutations: self.mutations.clone(),
            fields: self.fields.clone(),
        })
    }

    fn failure(&self, mut errors: Vec<BuildError>) -> BuildErrors {
        if self.options.errors == ErrorMode::FailFast {
            errors.truncate(1);
        }
        BuildErrors::new(errors)
    }

    fn inputs(&self) -> InputCollector<'_> {
        InputCollector::new(&self.registry, self.options.field_naming)
    }

    fn with_resolvers<T>(&self, build: impl FnOnce(&ResolverBuilder<'_, '_>) -> T) -> T {
        let objects = ObjectCollector::new(self.inputs());
        build(&ResolverBuilder::new(&objects))
    }

    fn is_halted(&self) -> bool {
        self.options.errors == ErrorMode::FailFast && !self.errors.is_empty()
    }

    fn record(&mut self, result: Result<(), BuildError>) -> &mut Self {
        if let Err(error) = result {
            tracing::debug!(%error, "invalid declaration");
            self.errors.push(error);
        }
        self
    }
}

fn expect_type(
    ty: Option<TypeRef>,
    descriptor: &TypeDescriptor,
    expected: &'static str,
) -> Result<(), BuildError> {
    match ty {
        Some(_) => Ok(()),
        None => Err(BuildError::UnexpectedTypeKind {
            type_name: descriptor.to_string(),
            expected,
        }),
    }
}

struct Types<'t>(&'t IndexMap<String, SchemaType>);

impl TypeLookup for Types<'_> {
    fn lookup(&self, name: &str) -> Option<SchemaType> {
        self.0.get(name).cloned()
    }
}

/// Checks the defaults of input fields against the complete set of types.
///
/// Defaults referring to a type that was still under construction could only be checked
/// in part when their field was built.
fn check_defaults(types: &IndexMap<String, SchemaType>) -> Vec<BuildError> {
    let lookup = Types(types);
    let mut errors = Vec::new();
    for object in types.values().filter_map(SchemaType::as_input_object) {
        for field in object.fields.values() {
            let Some(default) = &field.default_value else {
                continue;
            };
            if field.ty.validate_input_value(&default.value, &lookup).is_err() {
                errors.push(BuildError::InvalidDefault {
                    owner: object.name.clone(),
                    field: field.name.clone(),
                    value: default.value.to_string(),
                    expected: field.ty.to_string(),
                });
            }
        }
    }
    errors
}

fn root_type(
    operation: OperationType,
    resolvers: &IndexMap<String, Resolver>,
) -> Option<ObjectType> {
    if resolvers.is_empty() {
        return None;
    }
    let fields = resolvers
        .values()
        .map(|resolver| {
            let field = ObjectField {
                name: resolver.name().to_string(),
                description: None,
                ty: resolver.output().clone(),
                arguments: resolver.argument_config().clone(),
                resolved: true,
            };
            (field.name.clone(), field)
        })
        .collect();
    Some(ObjectType {
        name: operation.to_string(),
        description: None,
        fields,
    })
}

/// Copies `object`, with the field filled by `resolver` taking its arguments.
fn with_resolved_field(object: &ObjectType, resolver: &Resolver) -> ObjectType {
    let mut object = object.clone();
    match object.fields.get_mut(resolver.name()) {
        Some(field) => field.arguments = resolver.argument_config().clone(),
        None => {
            object.fields.insert(
                resolver.name().to_string(),
                ObjectField {
                    name: resolver.name().to_string(),
                    description: None,
                    ty: resolver.output().clone(),
                    arguments: resolver.argument_config().clone(),
                    resolved: true,
                },
            );
        }
    }
    object
}

/// A built schema: its types and the resolvers of its fields.
#[derive(Clone, Debug)]
pub struct Schema {
    types: IndexMap<String, SchemaType>,
    queries: IndexMap<String, Resolver>,
    mutations: IndexMap<String, Resolver>,
    fields: IndexMap<String, IndexMap<String, Resolver>>,
}

impl Schema {
    pub fn get_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    /// All the types, root operation types first.
    pub fn types(&self) -> impl Iterator<Item = &SchemaType> + '_ {
        self.types.values()
    }

    pub fn input_object(&self, name: &str) -> Option<&Arc<InputObjectType>> {
        self.get_type(name)?.as_input_object()
    }

    pub fn object(&self, name: &str) -> Option<&Arc<ObjectType>> {
        self.get_type(name)?.as_object()
    }

    pub fn root_resolver(&self, operation: OperationType, name: &str) -> Option<&Resolver> {
        match operation {
            OperationType::Query => self.queries.get(name),
            OperationType::Mutation => self.mutations.get(name),
        }
    }

    pub fn query_resolver(&self, name: &str) -> Option<&Resolver> {
        self.root_resolver(OperationType::Query, name)
    }

    pub fn mutation_resolver(&self, name: &str) -> Option<&Resolver> {
        self.root_resolver(OperationType::Mutation, name)
    }

    pub fn field_resolver(&self, object: &str, field: &str) -> Option<&Resolver> {
        self.fields.get(object)?.get(field)
    }

    /// Resolves the root field `name`, `None` when it has no resolver.
    pub fn resolve_root(
        &self,
        operation: OperationType,
        name: &str,
        params: ResolveParams,
    ) -> Option<Resolved> {
        Some(self.root_resolver(operation, name)?.resolve(params))
    }

    /// Resolves `object.field`, `None` when it has no resolver.
    pub fn resolve_field(
        &self,
        object: &str,
        field: &str,
        params: ResolveParams,
    ) -> Option<Resolved> {
        Some(self.field_resolver(object, field)?.resolve(params))
    }

    /// Coerces `value` to the input type `type_name`.
    ///
    /// Defaults of missing fields are applied and custom input parsers are run.
    pub fn coerce_input(&self, type_name: &str, value: &Value) -> Result<Value, FieldError> {
        schema::coerce_input(&TypeRef::named(type_name), value, self)
    }

    /// Coerces the values of field arguments, filling in defaults.
    pub fn coerce_arguments(
        &self,
        arguments: &FieldArguments,
        values: &Object,
    ) -> Result<Object, FieldError> {
        if let Some(unknown) = values
            .keys()
            .find(|name| !arguments.contains_key(name.as_str()))
        {
            return Err(FieldError::builder()
                .message(format!("unknown argument '{}'", unknown.as_str()))
                .extension_code("INVALID_INPUT")
                .build());
        }
        let mut coerced = Object::new();
        for argument in arguments.values() {
            let value = match (values.get(argument.name.as_str()), &argument.default_value) {
                (Some(value), _) => schema::coerce_input(&argument.ty, value, self)?,
                (None, Some(default)) => default.value.clone(),
                (None, None) if argument.ty.is_non_null() => {
                    return Err(FieldError::builder()
                        .message(format!("missing required argument '{}'", argument.name))
                        .extension_code("INVALID_INPUT")
                        .build());
                }
                (None, None) => continue,
            };
            coerced.insert(argument.name.clone(), value);
        }
        Ok(coerced)
    }

    /// The schema in SDL.
    pub fn to_sdl(&self) -> String {
        schema::print_definitions(self.types.values())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sdl())
    }
}

impl TypeLookup for Schema {
    fn lookup(&self, name: &str) -> Option<SchemaType> {
        self.types.get(name).cloned()
    }
}
