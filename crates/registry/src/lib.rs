//! Sluice - Registry
//!
//! Binds names used in configuration to source drivers, destination drivers
//! and hooks.
//!
//! # Design
//!
//! - **Explicit object**: built once at start-up and passed to the pipeline
//!   builder; tests use disposable registries
//! - **Single registration**: a name is bound at most once; the first binding
//!   stays resolvable after a rejected duplicate
//! - **Role-tagged drivers**: sources and destinations share one driver
//!   namespace, so looking a name up in the wrong role is a `TypeMismatch`
//!   rather than a `NotFound`. Hooks live in their own namespace.
//! - **Read-mostly**: registration takes the write lock, lookups the read lock
//!
//! # Example
//!
//! ```ignore
//! let registry = Registry::with_builtins();
//! registry.register_source("mysql", || Box::new(MysqlSource::default()) as Box<dyn Source>)?;
//!
//! let factory = registry.lookup_source("mysql")?;
//! let source = factory.create();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use sluice_destinations::{Destination, DestinationFactory, NullDestination, StdoutDestination};
use sluice_sources::{GeneratorSource, Source, SourceFactory};
use sluice_transform::{Hook, HookLookup, builtin_hooks};
use tracing::info;

mod error;

pub use error::{RegistryError, RegistryResult};

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

/// What a name is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    Destination,
    Hook,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Hook => "hook",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
enum DriverBinding {
    Source(Arc<dyn SourceFactory>),
    Destination(Arc<dyn DestinationFactory>),
}

impl DriverBinding {
    fn role(&self) -> Role {
        match self {
            Self::Source(_) => Role::Source,
            Self::Destination(_) => Role::Destination,
        }
    }
}

#[derive(Default)]
struct Tables {
    drivers: HashMap<String, DriverBinding>,
    hooks: HashMap<String, Arc<Hook>>,
}

/// Name tables for drivers and hooks
#[derive(Default)]
pub struct Registry {
    tables: RwLock<Tables>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("sources", &self.sources())
            .field("destinations", &self.destinations())
            .field("hooks", &self.hooks())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the bundled drivers and hooks
    ///
    /// - sources: `generator`
    /// - destinations: `null`, `stdout`
    /// - hooks: `delay`, `dataFilter`, `noop`
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_builtins();
        registry
    }

    fn register_builtins(&self) {
        let mut tables = self.tables.write();

        let generator: Arc<dyn SourceFactory> =
            Arc::new(|| Box::new(GeneratorSource::default()) as Box<dyn Source>);
        tables.drivers.insert(
            sluice_sources::generator::NAME.into(),
            DriverBinding::Source(generator),
        );

        let null: Arc<dyn DestinationFactory> =
            Arc::new(|| Box::new(NullDestination::new()) as Box<dyn Destination>);
        tables.drivers.insert(
            sluice_destinations::null::NAME.into(),
            DriverBinding::Destination(null),
        );

        let stdout: Arc<dyn DestinationFactory> =
            Arc::new(|| Box::new(StdoutDestination::new()) as Box<dyn Destination>);
        tables.drivers.insert(
            sluice_destinations::stdout::NAME.into(),
            DriverBinding::Destination(stdout),
        );

        for hook in builtin_hooks() {
            tables.hooks.insert(hook.name().to_string(), Arc::new(hook));
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Bind a source driver name
    pub fn register_source<F>(&self, name: &str, factory: F) -> RegistryResult<()>
    where
        F: SourceFactory + 'static,
    {
        self.register_driver(name, DriverBinding::Source(Arc::new(factory)))
    }

    /// Bind a destination driver name
    pub fn register_destination<F>(&self, name: &str, factory: F) -> RegistryResult<()>
    where
        F: DestinationFactory + 'static,
    {
        self.register_driver(name, DriverBinding::Destination(Arc::new(factory)))
    }

    fn register_driver(&self, name: &str, binding: DriverBinding) -> RegistryResult<()> {
        let role = binding.role();
        let mut tables = self.tables.write();
        if tables.drivers.contains_key(name) {
            return Err(RegistryError::duplicate(name, role));
        }
        tables.drivers.insert(name.to_string(), binding);
        info!(name, role = %role, "driver registered");
        Ok(())
    }

    /// Bind a hook under its own name
    pub fn register_hook(&self, hook: Hook) -> RegistryResult<()> {
        let mut tables = self.tables.write();
        if tables.hooks.contains_key(hook.name()) {
            return Err(RegistryError::duplicate(hook.name(), Role::Hook));
        }
        info!(name = hook.name(), arity = hook.arity(), "hook registered");
        tables.hooks.insert(hook.name().to_string(), Arc::new(hook));
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolve a source driver
    pub fn lookup_source(&self, name: &str) -> RegistryResult<Arc<dyn SourceFactory>> {
        match self.tables.read().drivers.get(name) {
            Some(DriverBinding::Source(factory)) => Ok(Arc::clone(factory)),
            Some(other) => Err(RegistryError::TypeMismatch {
                name: name.to_string(),
                expected: Role::Source,
                actual: other.role(),
            }),
            None => Err(RegistryError::not_found(name, Role::Source)),
        }
    }

    /// Resolve a destination driver
    pub fn lookup_destination(&self, name: &str) -> RegistryResult<Arc<dyn DestinationFactory>> {
        match self.tables.read().drivers.get(name) {
            Some(DriverBinding::Destination(factory)) => Ok(Arc::clone(factory)),
            Some(other) => Err(RegistryError::TypeMismatch {
                name: name.to_string(),
                expected: Role::Destination,
                actual: other.role(),
            }),
            None => Err(RegistryError::not_found(name, Role::Destination)),
        }
    }

    /// Resolve a hook
    pub fn lookup_hook(&self, name: &str) -> RegistryResult<Arc<Hook>> {
        self.tables
            .read()
            .hooks
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(name, Role::Hook))
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Registered source driver names, sorted
    pub fn sources(&self) -> Vec<String> {
        self.driver_names(Role::Source)
    }

    /// Registered destination driver names, sorted
    pub fn destinations(&self) -> Vec<String> {
        self.driver_names(Role::Destination)
    }

    /// Registered hooks, sorted by name
    pub fn hooks(&self) -> Vec<Arc<Hook>> {
        let mut hooks: Vec<_> = self.tables.read().hooks.values().cloned().collect();
        hooks.sort_by(|a, b| a.name().cmp(b.name()));
        hooks
    }

    fn driver_names(&self, role: Role) -> Vec<String> {
        let mut names: Vec<_> = self
            .tables
            .read()
            .drivers
            .iter()
            .filter(|(_, binding)| binding.role() == role)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl HookLookup for Registry {
    fn find_hook(&self, name: &str) -> Option<Arc<Hook>> {
        self.lookup_hook(name).ok()
    }
}
