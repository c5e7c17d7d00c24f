//! Resource control store
//!
//! The response filters only ever read resource controls, as a snapshot taken
//! once per request. The store behind that snapshot is pluggable; the static
//! implementation serves the `[[resource_controls]]` table of the config file.

use crate::access_control::types::ResourceControl;
use crate::config::ResourceControlConfig;
use crate::error::{ConfigError, StoreError};
// async_trait required for dyn-compatibility with Arc<dyn ResourceControlStore>
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Source of resource controls
#[async_trait]
pub trait ResourceControlStore: Send + Sync {
    /// All known resource controls. At most one per resource identifier.
    async fn resource_controls(&self) -> Result<Vec<ResourceControl>, StoreError>;

    /// Get a description of the store (for logging)
    fn store_type(&self) -> &'static str;
}

/// Immutable in-memory store
#[derive(Debug, Clone, Default)]
pub struct StaticResourceControlStore {
    controls: Arc<[ResourceControl]>,
}

impl StaticResourceControlStore {
    /// Create a store, rejecting two records for the same resource
    pub fn new(controls: Vec<ResourceControl>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for rc in &controls {
            if !seen.insert(rc.resource_id.as_str()) {
                return Err(ConfigError::DuplicateResourceControl {
                    resource_id: rc.resource_id.clone(),
                });
            }
        }
        Ok(Self {
            controls: controls.into(),
        })
    }

    /// Create a store from configuration entries
    pub fn from_config(entries: &[ResourceControlConfig]) -> Result<Self, ConfigError> {
        let controls = entries
            .iter()
            .zip(1u32..)
            .map(|(entry, position)| entry.to_resource_control(position))
            .collect();
        Self::new(controls)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[async_trait]
impl ResourceControlStore for StaticResourceControlStore {
    async fn resource_controls(&self) -> Result<Vec<ResourceControl>, StoreError> {
        Ok(self.controls.to_vec())
    }

    fn store_type(&self) -> &'static str {
        "static"
    }
}
