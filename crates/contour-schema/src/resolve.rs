//! Functional resolution layer.
//!
//! Resolvers compute context-dependent values for attributes whose
//! static descriptors are not enough, such as "can the current user
//! edit this field". They are attached by name, invoked lazily, never
//! cached, and never write back into the static layer.

use crate::types::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ResolveError
///
/// Transparent carrier for whatever error a user-supplied resolver
/// produced. The source chain is preserved rather than wrapped so the
/// application sees its own failure, not ours.
///

#[derive(Debug, ThisError)]
#[error(transparent)]
pub struct ResolveError(Box<dyn std::error::Error + Send + Sync + 'static>);

impl ResolveError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self(source.into())
    }

    /// Convenience for resolvers that fail with a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

///
/// Resolver
///
/// A named, pure function of application context. The context is an
/// opaque `&dyn Any` the application downcasts; resolvers must not
/// mutate schema state through it.
///

pub type Resolver = Arc<dyn Fn(&dyn Any) -> Result<Value, ResolveError> + Send + Sync>;

///
/// ResolverMap
///
/// Attribute name to resolver, insertion-ordered. Attaching under an
/// existing name replaces the resolver in place.
///

#[derive(Clone, Default)]
pub struct ResolverMap {
    entries: Vec<(String, Resolver)>,
}

impl ResolverMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn attach<F>(&mut self, attr: impl Into<String>, f: F)
    where
        F: Fn(&dyn Any) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        let attr = attr.into();
        let resolver: Resolver = Arc::new(f);

        match self.entries.iter_mut().find(|(name, _)| *name == attr) {
            Some((_, slot)) => *slot = resolver,
            None => self.entries.push((attr, resolver)),
        }
    }

    pub fn remove(&mut self, attr: &str) -> Option<Resolver> {
        let pos = self.entries.iter().position(|(name, _)| name == attr)?;

        Some(self.entries.remove(pos).1)
    }

    #[must_use]
    pub fn get(&self, attr: &str) -> Option<&Resolver> {
        self.entries
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, r)| r)
    }

    #[must_use]
    pub fn contains(&self, attr: &str) -> bool {
        self.get(attr).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Attribute names with resolvers attached, in attachment order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_replaces_in_place() {
        let mut resolvers = ResolverMap::new();
        resolvers.attach("can_edit", |_| Ok(Value::Bool(false)));
        resolvers.attach("show_index", |_| Ok(Value::Bool(true)));
        resolvers.attach("can_edit", |_| Ok(Value::Bool(true)));

        let names: Vec<_> = resolvers.names().collect();
        assert_eq!(names, vec!["can_edit", "show_index"]);

        let value = resolvers.get("can_edit").unwrap()(&()).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn remove_returns_the_resolver() {
        let mut resolvers = ResolverMap::new();
        resolvers.attach("label", |_| Ok(Value::Text("x".into())));

        assert!(resolvers.remove("label").is_some());
        assert!(resolvers.remove("label").is_none());
        assert!(resolvers.is_empty());
    }

    #[test]
    fn resolve_error_preserves_source_text() {
        let err = ResolveError::message("context missing user");
        assert_eq!(err.to_string(), "context missing user");
    }
}
