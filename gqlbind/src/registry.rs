//! Memoization of the schema types built from Rust types.

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::Mutex;
use parking_lot::ReentrantMutex;

use crate::configuration::CyclePolicy;
use crate::descriptor::TypeDescriptor;
use crate::descriptor::TypeKey;
use crate::error::BuildError;
use crate::schema::SchemaType;
use crate::schema::TypeLookup;

/// Maps Rust types to the schema types built from them.
///
/// Construction of a type and of everything it refers to runs as one session, during
/// which other threads wait. A type being built is `UnderConstruction`: meeting it again
/// during its own construction is a cycle.
pub struct TypeRegistry {
    session: ReentrantMutex<()>,
    state: Mutex<RegistryState>,
    cycles: CyclePolicy,
}

#[derive(Default)]
struct RegistryState {
    /// In order of first encounter.
    entries: IndexMap<TypeKey, Entry>,
    names: HashMap<String, TypeKey>,
}

struct Entry {
    name: String,
    state: EntryState,
}

enum EntryState {
    UnderConstruction,
    Built(SchemaType),
}

/// Outcome of [`TypeRegistry::ensure`].
#[derive(Debug, Clone)]
pub(crate) enum Ensured {
    Built(SchemaType),
    /// The type is under construction and can only be referred to by name.
    Pending { name: String },
}

impl Ensured {
    pub(crate) fn name(&self) -> &str {
        match self {
            Ensured::Built(ty) => ty.name(),
            Ensured::Pending { name } => name,
        }
    }
}

impl TypeRegistry {
    pub fn new(cycles: CyclePolicy) -> Self {
        Self {
            session: ReentrantMutex::new(()),
            state: Mutex::new(RegistryState::default()),
            cycles,
        }
    }

    /// Returns the schema type of `descriptor`'s base type, building it with `build` on
    /// first encounter under the GraphQL name `name`.
    ///
    /// On failure every entry added during the construction is removed.
    pub(crate) fn ensure(
        &self,
        descriptor: &TypeDescriptor,
        name: &str,
        build: impl FnOnce() -> Result<SchemaType, BuildError>,
    ) -> Result<Ensured, BuildError> {
        let _session = self.session.lock();
        let key = descriptor.key();
        let index = {
            let mut state = self.state.lock();
            match state.entries.get(&key) {
                Some(Entry {
                    state: EntryState::Built(ty),
                    ..
                }) => return Ok(Ensured::Built(ty.clone())),
                Some(Entry {
                    state: EntryState::UnderConstruction,
                    name,
                }) => {
                    return if self.cycles == CyclePolicy::AllowThroughIndirection
                        && descriptor.has_indirection()
                    {
                        Ok(Ensured::Pending { name: name.clone() })
                    } else {
                        Err(BuildError::CyclicType {
                            type_name: name.clone(),
                        })
                    };
                }
                None => {}
            }
            if let Some(first) = state.names.get(name).filter(|first| **first != key) {
                return Err(BuildError::DuplicateTypeName {
                    name: name.to_string(),
                    first: first.rust_name().to_string(),
                    second: key.rust_name().to_string(),
                });
            }
            state.entries.insert(
                key,
                Entry {
                    name: name.to_string(),
                    state: EntryState::UnderConstruction,
                },
            );
            state.names.insert(name.to_string(), key);
            state.entries.len() - 1
        };

        let built = build();

        let mut state = self.state.lock();
        match built {
            Ok(ty) => {
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.state = EntryState::Built(ty.clone());
                }
                tracing::debug!(type_name = %name, rust_type = key.rust_name(), "registered type");
                Ok(Ensured::Built(ty))
            }
            Err(error) => {
                let abandoned: Vec<_> = state.entries.drain(index..).collect();
                for (_, entry) in abandoned {
                    state.names.remove(&entry.name);
                }
                Err(error)
            }
        }
    }

    /// The built schema type of `key`.
    pub fn get(&self, key: &TypeKey) -> Option<SchemaType> {
        match self.state.lock().entries.get(key) {
            Some(Entry {
                state: EntryState::Built(ty),
                ..
            }) => Some(ty.clone()),
            _ => None,
        }
    }

    /// The built schema types, in order of first encounter.
    pub fn types(&self) -> Vec<SchemaType> {
        self.state
            .lock()
            .entries
            .values()
            .filter_map(|entry| match &entry.state {
                EntryState::Built(ty) => Some(ty.clone()),
                EntryState::UnderConstruction => None,
            })
            .collect()
    }

    /// The Rust type registered under the GraphQL name `name`.
    pub(crate) fn rust_name(&self, name: &str) -> Option<&'static str> {
        self.state.lock().names.get(name).map(TypeKey::rust_name)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(CyclePolicy::default())
    }
}

impl TypeLookup for TypeRegistry {
    fn lookup(&self, name: &str) -> Option<SchemaType> {
        let state = self.state.lock();
        let key = state.names.get(name)?;
        match &state.entries.get(key)?.state {
            EntryState::Built(ty) => Some(ty.clone()),
            EntryState::UnderConstruction => None,
        }
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TypeRegistry")
            .field("types", &state.names.keys().collect::<Vec<_>>())
            .field("cycles", &self.cycles)
            .finish()
    }
}
