//! An explicit, explicitly-constructed registry value standing in for the
//! source's process-wide mutable backend-kind table (Design Note "Global
//! registries"). A binary builds one, registers whatever backends it
//! links, and passes it to [`crate::QueryEngine::new`] — nothing in the
//! core crates reads a global.

use rustc_hash::FxHashMap;

/// Maps a backend name to a factory producing a fresh instance of `S`.
///
/// Generic over a single backend type `S` rather than a trait object of
/// `StorageContract` implementors: `StorageContract::Token` varies per
/// backend, so a registry spanning several concrete backend types would
/// need an object-safe erasure the engine has no other use for. A binary
/// linking more than one backend kind is expected to keep one `Registry<S>`
/// per kind.
pub struct Registry<S> {
    factories: FxHashMap<String, Box<dyn Fn() -> S>>,
}

impl<S> Registry<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: impl Fn() -> S + 'static) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    #[must_use]
    pub fn build(&self, name: &str) -> Option<S> {
        self.factories.get(name).map(|factory| factory())
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The name a [`BackendRegistry`] pre-registers the reference in-memory
/// backend under.
pub const MEMORY_BACKEND: &str = "memory";

/// A [`Registry`] of [`crate::MemoryStore`] factories. `default()`
/// pre-registers [`MEMORY_BACKEND`], mirroring "provide a default instance
/// for convenience" from the Design Notes.
pub type BackendRegistry = Registry<crate::MemoryStore>;

#[must_use]
pub fn default_backend_registry() -> BackendRegistry {
    let mut registry = Registry::new();
    registry.register(MEMORY_BACKEND, crate::MemoryStore::new);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_builds_memory_backend() {
        let registry = default_backend_registry();
        assert!(registry.build(MEMORY_BACKEND).is_some());
        assert!(registry.build("nonexistent").is_none());
    }
}
