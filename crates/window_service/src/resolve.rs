//! Dependency resolution for attach-time wiring
//!
//! External services handed to a node's `apply_resolving` hook travel in a
//! [`DependencySet`]: a small type-map keyed by `TypeId`. The graph never
//! inspects the contents; it only forwards the set to nodes that declare
//! the resolve capability.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-keyed bag of external dependencies for `apply_resolving`.
#[derive(Default)]
pub struct DependencySet {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl DependencySet {
    /// Create an empty dependency set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency, replacing any previous value of the same type.
    pub fn insert<T: Any>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Builder-style variant of [`DependencySet::insert`].
    #[must_use]
    pub fn with<T: Any>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Look up a dependency by type.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Whether a dependency of the given type is present.
    pub fn contains<T: Any>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Number of dependencies in the set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set carries no dependencies.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Score(u32);
    struct Label(String);

    #[test]
    fn insert_and_get_by_type() {
        let deps = DependencySet::new()
            .with(Score(7))
            .with(Label("hud".to_string()));

        assert_eq!(deps.len(), 2);
        assert_eq!(deps.get::<Score>().map(|s| s.0), Some(7));
        assert_eq!(deps.get::<Label>().map(|l| l.0.as_str()), Some("hud"));
        assert!(!deps.contains::<f32>());
    }

    #[test]
    fn later_insert_replaces_earlier_value() {
        let mut deps = DependencySet::new();
        deps.insert(Score(1));
        deps.insert(Score(2));

        assert_eq!(deps.len(), 1);
        assert_eq!(deps.get::<Score>().map(|s| s.0), Some(2));
    }
}
