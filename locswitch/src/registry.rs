//! Named FileIO factories.
//!
//! The delegate backend is chosen by name at runtime (`io-impl-delegate`).
//! Instead of loading types dynamically, every selectable backend registers a
//! factory under one or more names up front.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::io::FileIo;
use crate::memory::{MemoryFileIo, MemoryStore};

/// Constructs an uninitialized FileIO.
pub type FileIoFactory = Arc<dyn Fn() -> Result<Box<dyn FileIo>> + Send + Sync>;

/// Registered name of the in-memory backend.
pub const MEMORY_BACKEND: &str = "memory";

/// Registry mapping backend names to factories.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, FileIoFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the bundled backends.
    ///
    /// The in-memory backend is registered as `memory`; each construction gets
    /// a fresh, empty store.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MEMORY_BACKEND, || Ok(Box::new(MemoryFileIo::new())));
        registry
    }

    /// Register a factory under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn FileIo>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Register an in-memory backend named `name` that always uses `store`.
    ///
    /// Lets callers inspect what the delegate received after binding.
    pub fn register_memory_store(&mut self, name: impl Into<String>, store: MemoryStore) {
        self.register(name, move || {
            Ok(Box::new(MemoryFileIo::with_store(store.clone())))
        });
    }

    /// Add a factory (for method chaining).
    pub fn with_backend<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn FileIo>> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Look up the factory registered under `name`.
    pub fn get(&self, name: &str) -> Option<&FileIoFactory> {
        self.factories.get(name)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
