//! # In-process registry.
//!
//! Keeps registrations in a `HashMap` guarded by a read/write lock. Names are unique:
//! registering a name twice fails with [`RegistryError::AlreadyRegistered`], which keeps
//! the shared definition file free of duplicate service stubs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::RegistryError;
use crate::registry::{Registry, ServiceMetadata};

/// Registry held in memory for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryRegistry {
    services: RwLock<HashMap<String, ServiceMetadata>>,
}

impl InMemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sorted snapshot of registered service names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn register_service(
        &self,
        name: &str,
        metadata: ServiceMetadata,
    ) -> Result<(), RegistryError> {
        let mut services = self.services.write();
        if services.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        services.insert(name.to_string(), metadata);
        Ok(())
    }

    async fn get_service(&self, name: &str) -> Result<ServiceMetadata, RegistryError> {
        self.services
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }
}
