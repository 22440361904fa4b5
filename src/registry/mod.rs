//! # Service registry capability.
//!
//! The registration workflow depends only on the [`Registry`] trait; an in-process
//! [`InMemoryRegistry`] and an external service registry are interchangeable.
//!
//! ```text
//! Registrar ──► Arc<dyn Registry>
//!                   ├─► InMemoryRegistry (default)
//!                   └─► any external backend
//! ```

mod memory;

pub use memory::InMemoryRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Metadata describing a registered service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Domain the service is registered under.
    pub domain: String,
    /// Service version.
    pub version: String,
}

impl ServiceMetadata {
    pub fn new(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            version: version.into(),
        }
    }
}

/// Stores service-to-metadata mappings.
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// Records `metadata` under `name`.
    async fn register_service(
        &self,
        name: &str,
        metadata: ServiceMetadata,
    ) -> Result<(), RegistryError>;

    /// Returns the metadata registered under `name`.
    async fn get_service(&self, name: &str) -> Result<ServiceMetadata, RegistryError>;
}
