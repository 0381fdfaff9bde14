//! Plugin-based provider registry
//!
//! The registry allows zone providers and record stores to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::ProviderRegistry;
//! use zonesync_core::config::{ProviderConfig, StoreConfig};
//!
//! // Create a registry with the built-in stores
//! let registry = ProviderRegistry::with_builtin_stores();
//!
//! // Register providers
//! zonesync_provider_route53::register(&registry);
//!
//! // Create components from config
//! let provider = registry.create_provider(&config.provider)?;
//! let store = registry.create_record_store(&config.store).await?;
//! ```
//!
//! ## Registration
//!
//! Provider crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("route53", Box::new(Route53Factory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{ProviderConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::state::{FileRecordStoreFactory, MemoryRecordStoreFactory};
use crate::traits::{RecordStore, RecordStoreFactory, ZoneProvider, ZoneProviderFactory};

/// Registry for plugin-based provider and store creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered zone provider factories
    providers: RwLock<HashMap<String, Box<dyn ZoneProviderFactory>>>,

    /// Registered record store factories
    stores: RwLock<HashMap<String, Arc<dyn RecordStoreFactory>>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_record_store("memory", Box::new(MemoryRecordStoreFactory));
        registry.register_record_store("file", Box::new(FileRecordStoreFactory));
        registry
    }

    /// Register a zone provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "route53")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ZoneProviderFactory>,
    ) {
        write(&self.providers).insert(name.into(), factory);
    }

    /// Register a record store factory
    pub fn register_record_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn RecordStoreFactory>,
    ) {
        write(&self.stores).insert(name.into(), Arc::from(factory));
    }

    /// Create a zone provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        let provider_type = config.type_name();
        let providers = read(&self.providers);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a record store from configuration
    pub async fn create_record_store(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        let store_type = config.type_name();

        // Release the lock before calling async create
        let factory = read(&self.stores)
            .get(store_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown record store type: {}", store_type)))?;

        factory.create(config).await
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        read(&self.providers).keys().cloned().collect()
    }

    /// List all registered record store types
    pub fn list_record_stores(&self) -> Vec<String> {
        read(&self.stores).keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        read(&self.providers).contains_key(name)
    }

    /// Check if a record store type is registered
    pub fn has_record_store(&self, name: &str) -> bool {
        read(&self.stores).contains_key(name)
    }
}
