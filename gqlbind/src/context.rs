//! The request context carried through field resolution.

use std::any::Any;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Values that can be stored in a [`Context`].
///
/// A resolver may take such a value as a parameter, in which case it is read from the
/// request context, or return it, in which case it is merged into the context seen by
/// the resolvers of child fields.
pub trait ContextValue: Clone + Send + Sync + 'static {}

/// Request-scoped values, keyed by their type.
///
/// A `Context` is immutable: [`Context::with`] returns a new context sharing nothing
/// mutable with the original, so a resolution never observes changes made by sibling
/// fields.
#[derive(Clone, Default)]
pub struct Context {
    entries: Arc<HashMap<TypeId, Entry>>,
}

#[derive(Clone)]
struct Entry {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context holding `value`, replacing any value of the same type.
    #[must_use]
    pub fn with<T: ContextValue>(&self, value: T) -> Self {
        let mut entries = HashMap::clone(&self.entries);
        entries.insert(
            TypeId::of::<T>(),
            Entry {
                type_name: std::any::type_name::<T>(),
                value: Arc::new(value),
            },
        );
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the value of type `T`, if present.
    pub fn get<T: ContextValue>(&self) -> Option<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| (*entry.value).downcast_ref::<T>())
            .cloned()
    }

    pub fn contains<T: ContextValue>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns a context holding the values of both contexts; on conflicts `other` wins.
    #[must_use]
    pub fn merge(&self, other: &Context) -> Self {
        if other.entries.is_empty() {
            return self.clone();
        }
        let mut entries = HashMap::clone(&self.entries);
        entries.extend(
            other
                .entries
                .iter()
                .map(|(key, entry)| (*key, entry.clone())),
        );
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.type_name).collect();
        names.sort_unstable();
        f.debug_struct("Context").field("values", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Session(&'static str);
    impl ContextValue for Session {}

    #[derive(Clone, Debug, PartialEq)]
    struct Locale(&'static str);
    impl ContextValue for Locale {}

    #[test]
    fn with_does_not_touch_the_original() {
        let root = Context::new().with(Session("alice"));
        let child = root.with(Session("bob")).with(Locale("fr"));

        assert_eq!(root.get::<Session>(), Some(Session("alice")));
        assert_eq!(root.get::<Locale>(), None);
        assert_eq!(child.get::<Session>(), Some(Session("bob")));
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn merge_prefers_the_other_context() {
        let left = Context::new().with(Session("alice")).with(Locale("en"));
        let right = Context::new().with(Locale("fr"));

        let merged = left.merge(&right);
        assert_eq!(merged.get::<Session>(), Some(Session("alice")));
        assert_eq!(merged.get::<Locale>(), Some(Locale("fr")));
        assert!(left.merge(&Context::new()).contains::<Locale>());
    }
}
