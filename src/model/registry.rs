//! Model registry: descriptors keyed by name, built at startup then frozen.

use crate::error::DiscoveryError;
use crate::model::descriptor::ModelDescriptor;
use crate::model::entity::Entity;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Name -> descriptor table. Mutable only while it is being built.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    by_name: BTreeMap<String, Arc<ModelDescriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Insert or overwrite by `descriptor.name`. Returns the replaced descriptor, if any.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> Option<Arc<ModelDescriptor>> {
        self.by_name
            .insert(descriptor.name.clone(), Arc::new(descriptor))
    }

    /// Derive and register a Rust type directly, bypassing discovery.
    pub fn register_entity<T: Entity>(&mut self, type_name: &'static str) -> Result<(), DiscoveryError> {
        let descriptor = ModelDescriptor::of::<T>(type_name)?;
        self.register(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelDescriptor>> {
        self.by_name.get(name).cloned()
    }

    /// All entries, ordered by name.
    pub fn list(&self) -> impl Iterator<Item = (&str, &Arc<ModelDescriptor>)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// End the build phase. The returned registry is read-only.
    pub fn freeze(self) -> Arc<Registry> {
        Arc::new(self)
    }
}

/// Shared, swappable pointer to the frozen registry.
///
/// Requests take a snapshot; a rebuilt registry replaces the whole snapshot at once.
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<Registry>>>,
}

impl RegistryHandle {
    pub fn new(registry: Arc<Registry>) -> Self {
        RegistryHandle {
            current: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn snapshot(&self) -> Arc<Registry> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new registry; in-flight requests keep the snapshot they already hold.
    pub fn replace(&self, registry: Arc<Registry>) -> Arc<Registry> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, registry)
    }
}
