//! Mutation workflow
//!
//! Orchestrates creation and deletion of single zones and records:
//!
//! 1. Validate against local state
//! 2. Call the provider
//! 3. Persist the confirmed result
//! 4. Record the returned change id
//!
//! A local row is written only after the provider confirmed the mutation.
//! When the provider call fails or times out, the store is left untouched.
//!
//! The `*_from_provider_confirmed` writers never call the provider. They
//! mirror state that was just read from it and are used by the reconciler.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventSink};
use crate::locks::ZoneLocks;
use crate::model::{
    Change, ChangeOwner, HostedZone, NewChange, NewRecord, NewZone, Record, RecordId, RecordKind,
    StateFilter, ZoneId,
};
use crate::timed::TimedProvider;
use crate::traits::{ChangeAction, ChangeRequest, ProviderZone, RecordSet, RecordStore};

/// A record to create through the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    /// Local id of the owning zone
    pub zone_id: ZoneId,
    pub name: String,
    pub kind: RecordKind,
    /// Falls back to the configured default TTL
    pub ttl: Option<u32>,
    pub values: Vec<String>,
}

/// A row written after a provider mutation, with the change it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked<T> {
    pub row: T,
    pub change: Change,
}

/// Create/delete orchestration for zones and records
#[derive(Clone)]
pub struct MutationWorkflow {
    provider: TimedProvider,
    store: Arc<dyn RecordStore>,
    locks: ZoneLocks,
    events: EventSink,
    change_comment: String,
    default_ttl: u32,
}

impl MutationWorkflow {
    pub fn new(
        provider: TimedProvider,
        store: Arc<dyn RecordStore>,
        locks: ZoneLocks,
        events: EventSink,
        change_comment: impl Into<String>,
        default_ttl: u32,
    ) -> Self {
        Self {
            provider,
            store,
            locks,
            events,
            change_comment: change_comment.into(),
            default_ttl,
        }
    }

    /// Create a hosted zone at the provider and mirror it locally
    ///
    /// Persists the zone under the provider-normalized name, an NS record
    /// holding the delegation nameservers, and the creation change.
    pub async fn create_zone(&self, name: &str, actor: &str) -> Result<Tracked<HostedZone>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("Zone name cannot be empty"));
        }

        let created = self.provider.create_zone(name).await?;
        let _guard = self.locks.lock(&created.id).await;

        // A sync may have adopted the zone between the provider call and the lock
        let zone = match self.store.find_zone_by_provider_id(&created.id).await? {
            Some(zone) => {
                debug!("Zone {} was already adopted by a sync", zone.provider_id);
                zone
            }
            None => {
                let confirmed = ProviderZone {
                    id: created.id.clone(),
                    name: created.name.clone(),
                };
                self.create_zone_from_provider_confirmed(&confirmed, actor)
                    .await
                    .inspect_err(|e| {
                        error!(
                            "Zone {} exists at {} but could not be stored: {}",
                            created.id,
                            self.provider.provider_name(),
                            e
                        )
                    })?
            }
        };

        if !created.delegation_nameservers.is_empty()
            && self.nameservers(zone.id).await?.is_empty()
        {
            let ns = RecordSet {
                name: zone.name.clone(),
                kind: RecordKind::Ns,
                ttl: self.default_ttl,
                values: created.delegation_nameservers.clone(),
            };
            self.create_record_from_provider_confirmed(zone.id, &ns, actor)
                .await?;
        }

        let change = self
            .record_change(&created.change_id, ChangeOwner::Zone(zone.id))
            .await?;

        info!("Created zone {} ({})", zone.name, zone.provider_id);
        self.events.emit(EngineEvent::ZoneCreated {
            zone: zone.provider_id.clone(),
            name: zone.name.clone(),
        });

        Ok(Tracked { row: zone, change })
    }

    /// Delete a hosted zone at the provider, then retire it and its records
    ///
    /// The provider returns no change for a zone deletion, so none is stored.
    pub async fn delete_zone(&self, zone_id: ZoneId) -> Result<()> {
        let zone = self.active_zone(zone_id).await?;
        let _guard = self.locks.lock(&zone.provider_id).await;
        // A concurrent delete may have won the lock
        let zone = self.active_zone(zone.id).await?;

        self.provider.delete_zone(&zone.provider_id).await?;
        self.store.mark_zone_deleted(zone.id).await?;

        info!("Deleted zone {} ({})", zone.name, zone.provider_id);
        self.events.emit(EngineEvent::ZoneDeleted {
            zone: zone.provider_id,
        });

        Ok(())
    }

    /// Create a record set at the provider, then persist it
    ///
    /// Unknown or deleted zones and empty value lists are rejected before
    /// the provider is contacted.
    pub async fn create_record(&self, input: RecordInput, actor: &str) -> Result<Tracked<Record>> {
        if input.name.trim().is_empty() {
            return Err(Error::invalid_input("Record name cannot be empty"));
        }
        if input.values.is_empty() {
            return Err(Error::invalid_input(format!(
                "Record {} {} needs at least one value",
                input.name, input.kind
            )));
        }

        let zone = self.active_zone(input.zone_id).await?;
        let _guard = self.locks.lock(&zone.provider_id).await;
        let zone = self.active_zone(zone.id).await?;

        let ttl = input.ttl.unwrap_or(self.default_ttl);
        let request = ChangeRequest {
            action: ChangeAction::Create,
            name: input.name.clone(),
            kind: input.kind,
            ttl,
            values: input.values.clone(),
            comment: self.change_comment.clone(),
        };
        let change_id = self
            .provider
            .submit_change(&zone.provider_id, &request)
            .await?;

        let record = self
            .store
            .insert_record(NewRecord {
                zone_id: zone.id,
                name: input.name,
                kind: input.kind,
                ttl,
                values: input.values,
                created_by: actor.to_string(),
            })
            .await
            .inspect_err(|e| {
                error!(
                    "Change {} was accepted by {} but the record could not be stored: {}",
                    change_id,
                    self.provider.provider_name(),
                    e
                )
            })?;
        let change = self
            .record_change(&change_id, ChangeOwner::Record(record.id))
            .await?;

        info!(
            "Created record {} {} in {} (change {})",
            record.name, record.kind, zone.name, change.change_id
        );
        self.events.emit(EngineEvent::RecordCreated {
            zone: zone.provider_id,
            record_id: record.id,
            name: record.name.clone(),
            kind: record.kind,
        });

        Ok(Tracked { row: record, change })
    }

    /// Delete a record set at the provider, then retire the local row
    ///
    /// The DELETE mirrors the record's stored name, kind, TTL and values.
    pub async fn delete_record(&self, record_id: RecordId) -> Result<Change> {
        let (record, zone) = self.active_record(record_id).await?;
        let _guard = self.locks.lock(&zone.provider_id).await;
        let (record, zone) = self.active_record(record.id).await?;

        let request = ChangeRequest {
            action: ChangeAction::Delete,
            name: record.name.clone(),
            kind: record.kind,
            ttl: record.ttl,
            values: record.value_strings(),
            comment: self.change_comment.clone(),
        };
        let change_id = self
            .provider
            .submit_change(&zone.provider_id, &request)
            .await?;

        let change = self
            .record_change(&change_id, ChangeOwner::Record(record.id))
            .await?;
        self.store.mark_record_deleted(record.id).await?;

        info!(
            "Deleted record {} {} from {} (change {})",
            record.name, record.kind, zone.name, change.change_id
        );
        self.events.emit(EngineEvent::RecordDeleted {
            zone: zone.provider_id,
            record_id: record.id,
        });

        Ok(change)
    }

    /// Insert a zone row for a zone the provider reported
    ///
    /// The caller must hold the zone's lock.
    pub async fn create_zone_from_provider_confirmed(
        &self,
        zone: &ProviderZone,
        actor: &str,
    ) -> Result<HostedZone> {
        self.store
            .insert_zone(NewZone {
                provider_id: zone.id.clone(),
                name: zone.name.clone(),
                created_by: actor.to_string(),
            })
            .await
    }

    /// Insert a record row for a record set the provider reported
    ///
    /// The caller must hold the zone's lock.
    pub async fn create_record_from_provider_confirmed(
        &self,
        zone_id: ZoneId,
        set: &RecordSet,
        actor: &str,
    ) -> Result<Record> {
        self.store
            .insert_record(NewRecord {
                zone_id,
                name: set.name.clone(),
                kind: set.kind,
                ttl: set.ttl,
                values: set.values.clone(),
                created_by: actor.to_string(),
            })
            .await
    }

    /// Retire every active record of a zone ahead of a rebuild
    ///
    /// The caller must hold the zone's lock.
    pub async fn retire_records_confirmed(&self, zone_id: ZoneId) -> Result<usize> {
        self.store.retire_zone_records(zone_id).await
    }

    /// Values of the zone's active NS records, in stored order
    pub async fn nameservers(&self, zone_id: ZoneId) -> Result<Vec<String>> {
        let zone = self
            .store
            .get_zone(zone_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("zone {}", zone_id)))?;

        let records = self.store.list_records(zone.id, StateFilter::Active).await?;
        Ok(records
            .into_iter()
            .filter(|r| r.kind == RecordKind::Ns)
            .flat_map(|r| r.values.into_iter().map(|v| v.value))
            .collect())
    }

    async fn record_change(&self, change_id: &str, owner: ChangeOwner) -> Result<Change> {
        let change = self
            .store
            .insert_change(NewChange {
                change_id: change_id.to_string(),
                owner,
            })
            .await?;
        self.events.emit(EngineEvent::ChangeRecorded {
            change_id: change.change_id.clone(),
            owner,
        });
        Ok(change)
    }

    async fn active_zone(&self, zone_id: ZoneId) -> Result<HostedZone> {
        match self.store.get_zone(zone_id).await? {
            Some(zone) if zone.is_active() => Ok(zone),
            Some(_) => Err(Error::not_found(format!("zone {} is deleted", zone_id))),
            None => Err(Error::not_found(format!("zone {}", zone_id))),
        }
    }

    async fn active_record(&self, record_id: RecordId) -> Result<(Record, HostedZone)> {
        let record = match self.store.get_record(record_id).await? {
            Some(record) if record.is_active() => record,
            Some(_) => {
                return Err(Error::not_found(format!(
                    "record {} is deleted",
                    record_id
                )));
            }
            None => return Err(Error::not_found(format!("record {}", record_id))),
        };
        let zone = self.active_zone(record.zone_id).await?;
        Ok((record, zone))
    }
}
