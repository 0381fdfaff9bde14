// # Record Store Trait
//
// Defines the interface for the local durable mirror of hosted zones,
// records and tracked changes.
//
// ## Purpose
//
// The record store keeps:
// - Hosted zones, keyed by a local id and carrying the provider zone id
// - Records with their values, owned by a zone
// - Change ids returned by mutating provider calls
//
// Rows are soft-deleted: retiring a zone or record moves it to
// `RowState::Deleted` and keeps it for audit.
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore`
// - JSON file: `FileRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::{RecordStore, MemoryRecordStore};
// use zonesync_core::model::{NewZone, StateFilter};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = MemoryRecordStore::new();
//
//     let zone = store.insert_zone(NewZone {
//         provider_id: "Z1".into(),
//         name: "example.com.".into(),
//         created_by: "admin".into(),
//     }).await?;
//
//     let records = store.list_records(zone.id, StateFilter::Active).await?;
//     assert!(records.is_empty());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{
    Change, ChangeOwner, ChangeRowId, HostedZone, NewChange, NewRecord, NewZone, Record,
    RecordId, StateFilter, ZoneId,
};

/// Trait for record store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Invariants
///
/// - A provider zone id is unique across all zone rows, deleted or not
/// - A record can only be inserted into an active zone
/// - Ids are assigned by the store and never reused
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Implement locking for thread safety
///
/// ## Forbidden Capabilities
/// - ❌ Call the provider (owned by the workflow and reconciler)
/// - ❌ Decide when to sync (owned by `ZoneSyncEngine`)
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new active zone
    ///
    /// Fails if any zone row, deleted or not, already carries the provider id.
    async fn insert_zone(&self, zone: NewZone) -> Result<HostedZone, crate::Error>;

    /// Get a zone by local id, in any state
    async fn get_zone(&self, id: ZoneId) -> Result<Option<HostedZone>, crate::Error>;

    /// Find the active zone carrying a provider zone id
    async fn find_zone_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<HostedZone>, crate::Error>;

    /// Find an active zone by name
    async fn find_zone_by_name(&self, name: &str) -> Result<Option<HostedZone>, crate::Error>;

    /// List zones matching a state filter, ordered by local id
    async fn list_zones(&self, filter: StateFilter) -> Result<Vec<HostedZone>, crate::Error>;

    /// Persist a new name for a zone
    async fn rename_zone(&self, id: ZoneId, name: &str) -> Result<(), crate::Error>;

    /// Retire a zone and every active record it owns
    async fn mark_zone_deleted(&self, id: ZoneId) -> Result<(), crate::Error>;

    /// Insert a new active record with its values
    async fn insert_record(&self, record: NewRecord) -> Result<Record, crate::Error>;

    /// Get a record by local id, in any state
    async fn get_record(&self, id: RecordId) -> Result<Option<Record>, crate::Error>;

    /// List a zone's records matching a state filter, ordered by local id
    async fn list_records(
        &self,
        zone_id: ZoneId,
        filter: StateFilter,
    ) -> Result<Vec<Record>, crate::Error>;

    /// Retire a single record
    async fn mark_record_deleted(&self, id: RecordId) -> Result<(), crate::Error>;

    /// Retire every active record of a zone
    ///
    /// # Returns
    ///
    /// The number of records retired
    async fn retire_zone_records(&self, zone_id: ZoneId) -> Result<usize, crate::Error>;

    /// Record a provider change id
    async fn insert_change(&self, change: NewChange) -> Result<Change, crate::Error>;

    /// Get a change row by local id
    async fn get_change(&self, id: ChangeRowId) -> Result<Option<Change>, crate::Error>;

    /// List the changes recorded for an owner, oldest first
    async fn list_changes(&self, owner: ChangeOwner) -> Result<Vec<Change>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing record stores from configuration
#[async_trait]
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}
