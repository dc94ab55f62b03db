//! Per-actor component name index.
//!
//! Each actor keeps a map from component name to every component in its tree
//! with that name. The index is updated synchronously on every attach and
//! detach (including whole subtrees), so lookups never need a tree walk and
//! never observe a stale shape.

use std::collections::HashMap;

use crate::ids::ComponentId;

/// Name → components lookup, maintained incrementally.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    /// Components keyed by name, in registration order.
    entries: HashMap<String, Vec<ComponentId>>,
}

impl NameIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component under `name`. Registering the same component
    /// twice under one name is a no-op.
    pub fn register(&mut self, name: &str, component: ComponentId) {
        let bucket = self.entries.entry(name.to_string()).or_default();
        if !bucket.contains(&component) {
            bucket.push(component);
        }
    }

    /// Remove a component from `name`'s bucket.
    ///
    /// Returns `true` if the component was found and removed.
    pub fn unregister(&mut self, name: &str, component: ComponentId) -> bool {
        if let Some(bucket) = self.entries.get_mut(name)
            && let Some(pos) = bucket.iter().position(|&id| id == component)
        {
            bucket.remove(pos);
            // Drop empty buckets so `len` reflects live names only.
            if bucket.is_empty() {
                self.entries.remove(name);
            }
            return true;
        }
        false
    }

    /// Returns every component registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> &[ComponentId] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if `component` is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str, component: ComponentId) -> bool {
        self.get(name).contains(&component)
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no names are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the total number of registered components.
    #[must_use]
    pub fn total_components(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
