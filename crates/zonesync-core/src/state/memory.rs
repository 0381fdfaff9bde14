// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for one-shot runs where the provider is the only
// source of truth anyway (a `sync` rebuilds everything).
//
// ## Crash Behavior
//
// - All rows, including soft-deleted audit rows and change ids, are lost
// - The next `sync_all` recreates active zones and records from the provider

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::StoreConfig;
use crate::model::{
    Change, ChangeOwner, ChangeRowId, HostedZone, NewChange, NewRecord, NewZone, Record,
    RecordId, StateFilter, ZoneId,
};
use crate::state::tables::Tables;
use crate::traits::record_store::{RecordStore, RecordStoreFactory};

/// In-memory record store implementation
///
/// All tables live behind a single RwLock.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::state::MemoryRecordStore;
/// use zonesync_core::traits::RecordStore;
/// use zonesync_core::model::{NewZone, StateFilter};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     store.insert_zone(NewZone {
///         provider_id: "Z1".into(),
///         name: "example.com.".into(),
///         created_by: "admin".into(),
///     }).await?;
///
///     assert_eq!(store.list_zones(StateFilter::Active).await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryRecordStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every row and reset id counters
    pub async fn clear(&self) {
        *self.inner.write().await = Tables::default();
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_zone(&self, zone: NewZone) -> Result<HostedZone, Error> {
        self.inner.write().await.insert_zone(zone)
    }

    async fn get_zone(&self, id: ZoneId) -> Result<Option<HostedZone>, Error> {
        Ok(self.inner.read().await.get_zone(id))
    }

    async fn find_zone_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<HostedZone>, Error> {
        Ok(self.inner.read().await.find_zone_by_provider_id(provider_id))
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<HostedZone>, Error> {
        Ok(self.inner.read().await.find_zone_by_name(name))
    }

    async fn list_zones(&self, filter: StateFilter) -> Result<Vec<HostedZone>, Error> {
        Ok(self.inner.read().await.list_zones(filter))
    }

    async fn rename_zone(&self, id: ZoneId, name: &str) -> Result<(), Error> {
        self.inner.write().await.rename_zone(id, name)
    }

    async fn mark_zone_deleted(&self, id: ZoneId) -> Result<(), Error> {
        self.inner.write().await.mark_zone_deleted(id)
    }

    async fn insert_record(&self, record: NewRecord) -> Result<Record, Error> {
        self.inner.write().await.insert_record(record)
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<Record>, Error> {
        Ok(self.inner.read().await.get_record(id))
    }

    async fn list_records(
        &self,
        zone_id: ZoneId,
        filter: StateFilter,
    ) -> Result<Vec<Record>, Error> {
        Ok(self.inner.read().await.list_records(zone_id, filter))
    }

    async fn mark_record_deleted(&self, id: RecordId) -> Result<(), Error> {
        self.inner.write().await.mark_record_deleted(id)
    }

    async fn retire_zone_records(&self, zone_id: ZoneId) -> Result<usize, Error> {
        Ok(self.inner.write().await.retire_zone_records(zone_id))
    }

    async fn insert_change(&self, change: NewChange) -> Result<Change, Error> {
        self.inner.write().await.insert_change(change)
    }

    async fn get_change(&self, id: ChangeRowId) -> Result<Option<Change>, Error> {
        Ok(self.inner.read().await.get_change(id))
    }

    async fn list_changes(&self, owner: ChangeOwner) -> Result<Vec<Change>, Error> {
        Ok(self.inner.read().await.list_changes(owner))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

/// Factory for `type = "memory"` store configurations
pub struct MemoryRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for MemoryRecordStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryRecordStore::new())),
            _ => Err(Error::config("Invalid config for memory record store")),
        }
    }
}
