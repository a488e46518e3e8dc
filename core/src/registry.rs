//! Process-wide instance registry.
//!
//! Replaces a mutable static "the one open tracker" slot: instances are keyed
//! by a fixed identifier and have an explicit lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Key of the per-client tracker.
pub const TRACKER_KEY: &str = "alembic";

#[derive(Debug)]
pub struct Registry<T> {
    instances: Mutex<HashMap<&'static str, Arc<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn instances(&self) -> MutexGuard<'_, HashMap<&'static str, Arc<T>>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the live instance for `key`, creating it with `init` if absent.
    /// `init` runs at most once per lifecycle.
    pub fn get_or_create(&self, key: &'static str, init: impl FnOnce() -> T) -> Arc<T> {
        let mut instances = self.instances();
        Arc::clone(instances.entry(key).or_insert_with(|| {
            tracing::debug!(key, "Creating registry instance");
            Arc::new(init())
        }))
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.instances().get(key).cloned()
    }

    /// End the instance's lifecycle. Holders of the old `Arc` keep it alive;
    /// the next `get_or_create` builds a fresh one.
    pub fn reset(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.instances().remove(key);
        if removed.is_some() {
            tracing::debug!(key, "Reset registry instance");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_returns_the_same_instance() {
        let registry = Registry::new();
        let first = registry.get_or_create(TRACKER_KEY, || 1);
        let second = registry.get_or_create(TRACKER_KEY, || 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 1);
    }

    #[test]
    fn reset_starts_a_new_lifecycle() {
        let registry = Registry::new();
        let old = registry.get_or_create(TRACKER_KEY, || "old");
        assert!(registry.reset(TRACKER_KEY).is_some());
        assert!(registry.get(TRACKER_KEY).is_none());
        assert!(registry.reset(TRACKER_KEY).is_none());

        let new = registry.get_or_create(TRACKER_KEY, || "new");
        assert_eq!((*old, *new), ("old", "new"));
    }

    #[test]
    fn keys_are_independent() {
        let registry = Registry::new();
        registry.get_or_create("a", || 1);
        assert!(registry.get("b").is_none());
        assert_eq!(registry.get("a").as_deref(), Some(&1));
    }
}
