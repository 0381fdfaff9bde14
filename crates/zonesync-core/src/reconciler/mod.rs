//! Reconciler
//!
//! Rebuilds local zone and record rows from the provider's authoritative
//! state.
//!
//! ## Zone sync steps
//!
//! ```text
//! get_zone ──► rename ──► retire active records ──► list_record_sets ──► insert records
//!                         (destructive step)
//! ```
//!
//! A failure before the destructive step leaves the store untouched. A
//! failure after it leaves the zone without active records and is reported
//! as [`Error::Inconsistent`]; the next successful sync repairs it.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventSink};
use crate::locks::ZoneLocks;
use crate::model::{HostedZone, StateFilter, ZoneId};
use crate::timed::TimedProvider;
use crate::traits::{ProviderZone, RecordStore};
use crate::workflow::MutationWorkflow;

/// Outcome of one successful zone sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSyncSummary {
    /// Local zone id
    pub zone_id: ZoneId,
    pub provider_id: String,
    pub name: String,
    /// Whether the local zone row was created by this pass
    pub created: bool,
    /// Records retired by the destructive step
    pub retired: usize,
    /// Records inserted from provider record sets
    pub inserted: usize,
    /// Record sets that could not be mirrored
    pub skipped: usize,
}

/// A zone whose sync failed during [`Reconciler::sync_all`]
#[derive(Debug)]
pub struct ZoneSyncFailure {
    pub provider_id: String,
    pub name: String,
    pub error: Error,
}

/// Result of a full reconciliation pass
#[derive(Debug, Default)]
pub struct SyncReport {
    pub synced: Vec<ZoneSyncSummary>,
    pub failed: Vec<ZoneSyncFailure>,
}

impl SyncReport {
    /// Whether every listed zone synced
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pulls provider state and rewrites the record store to match
#[derive(Clone)]
pub struct Reconciler {
    provider: TimedProvider,
    store: Arc<dyn RecordStore>,
    workflow: MutationWorkflow,
    locks: ZoneLocks,
    events: EventSink,
}

impl Reconciler {
    pub fn new(
        provider: TimedProvider,
        store: Arc<dyn RecordStore>,
        workflow: MutationWorkflow,
        locks: ZoneLocks,
        events: EventSink,
    ) -> Self {
        Self {
            provider,
            store,
            workflow,
            locks,
            events,
        }
    }

    /// Sync every zone the provider lists
    ///
    /// Zones are matched by provider id. An active local zone with the same
    /// name whose provider id is no longer listed is treated as replaced:
    /// it is retired and a new row is created for the listed zone. Per-zone
    /// failures are collected in the report and do not stop other zones.
    pub async fn sync_all(&self, actor: &str) -> Result<SyncReport> {
        let listed = self.provider.list_zones().await?;
        info!(
            "Reconciling {} zones from {}",
            listed.len(),
            self.provider.provider_name()
        );

        let listed_ids: HashSet<&str> = listed.iter().map(|z| z.id.as_str()).collect();
        let mut report = SyncReport::default();

        for provider_zone in &listed {
            let result = async {
                let _guard = self.locks.lock(&provider_zone.id).await;
                let (zone, created) = self
                    .resolve_local_zone(provider_zone, &listed_ids, actor)
                    .await?;
                let mut summary = self.sync_locked(zone, actor).await?;
                summary.created = created;
                Ok::<_, Error>(summary)
            }
            .await;

            match result {
                Ok(summary) => report.synced.push(summary),
                Err(e) => {
                    error!(
                        "Sync of zone {} ({}) failed: {}",
                        provider_zone.name, provider_zone.id, e
                    );
                    report.failed.push(ZoneSyncFailure {
                        provider_id: provider_zone.id.clone(),
                        name: provider_zone.name.clone(),
                        error: e,
                    });
                }
            }
        }

        for zone in self.store.list_zones(StateFilter::Active).await? {
            if !listed_ids.contains(zone.provider_id.as_str()) {
                warn!(
                    "Zone {} ({}) is not listed by {}, leaving it untouched",
                    zone.name,
                    zone.provider_id,
                    self.provider.provider_name()
                );
            }
        }

        info!(
            "Reconciliation finished: {} synced, {} failed",
            report.synced.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Sync a single active zone from the provider
    pub async fn sync(&self, zone_id: ZoneId, actor: &str) -> Result<ZoneSyncSummary> {
        let zone = self.active_zone(zone_id).await?;
        let _guard = self.locks.lock(&zone.provider_id).await;
        let zone = self.active_zone(zone.id).await?;
        self.sync_locked(zone, actor).await
    }

    async fn resolve_local_zone(
        &self,
        provider_zone: &ProviderZone,
        listed_ids: &HashSet<&str>,
        actor: &str,
    ) -> Result<(HostedZone, bool)> {
        if let Some(zone) = self
            .store
            .find_zone_by_provider_id(&provider_zone.id)
            .await?
        {
            return Ok((zone, false));
        }

        if let Some(stale) = self.store.find_zone_by_name(&provider_zone.name).await?
            && !listed_ids.contains(stale.provider_id.as_str())
        {
            // Mutations on the old zone hold its lock, not the new one
            let _stale_guard = self.locks.lock(&stale.provider_id).await;
            match self.store.get_zone(stale.id).await? {
                Some(stale) if stale.is_active() => {
                    info!(
                        "Zone {} was recreated at the provider ({} -> {}), retiring old row",
                        stale.name, stale.provider_id, provider_zone.id
                    );
                    self.store.mark_zone_deleted(stale.id).await?;
                }
                _ => debug!("Zone {} was retired while waiting for its lock", stale.id),
            }
        }

        let zone = self
            .workflow
            .create_zone_from_provider_confirmed(provider_zone, actor)
            .await?;
        debug!("Adopted zone {} ({})", zone.name, zone.provider_id);
        Ok((zone, true))
    }

    async fn sync_locked(&self, zone: HostedZone, actor: &str) -> Result<ZoneSyncSummary> {
        let provider_zone = match self.provider.get_zone(&zone.provider_id).await {
            Ok(pz) => pz,
            Err(e) => return Err(self.failed(&zone, e)),
        };
        if provider_zone.name != zone.name {
            info!(
                "Zone {} renamed at provider: {} -> {}",
                zone.provider_id, zone.name, provider_zone.name
            );
            if let Err(e) = self.store.rename_zone(zone.id, &provider_zone.name).await {
                return Err(self.failed(&zone, e));
            }
        }

        let retired = match self.workflow.retire_records_confirmed(zone.id).await {
            Ok(n) => n,
            Err(e) => return Err(self.failed(&zone, e)),
        };

        // Destructive step done: any failure below leaves the zone empty
        let sets = match self.provider.list_record_sets(&zone.provider_id).await {
            Ok(sets) => sets,
            Err(e) => return Err(self.inconsistent(&zone, e)),
        };

        let mut inserted = 0;
        let mut skipped = 0;
        for set in &sets {
            if set.values.is_empty() {
                warn!(
                    "Skipping record set {} {} in {}: no values",
                    set.name, set.kind, provider_zone.name
                );
                skipped += 1;
                continue;
            }
            if let Err(e) = self
                .workflow
                .create_record_from_provider_confirmed(zone.id, set, actor)
                .await
            {
                return Err(self.inconsistent(&zone, e));
            }
            inserted += 1;
        }

        info!(
            "Synced zone {} ({}): {} retired, {} inserted, {} skipped",
            provider_zone.name, zone.provider_id, retired, inserted, skipped
        );
        self.events.emit(EngineEvent::ZoneSynced {
            zone: zone.provider_id.clone(),
            name: provider_zone.name.clone(),
            records: inserted,
            retired,
        });

        Ok(ZoneSyncSummary {
            zone_id: zone.id,
            provider_id: zone.provider_id,
            name: provider_zone.name,
            created: false,
            retired,
            inserted,
            skipped,
        })
    }

    fn failed(&self, zone: &HostedZone, e: Error) -> Error {
        self.events.emit(EngineEvent::SyncFailed {
            zone: zone.provider_id.clone(),
            error: e.to_string(),
        });
        e
    }

    fn inconsistent(&self, zone: &HostedZone, e: Error) -> Error {
        warn!(
            "Zone {} ({}) has no active records until the next successful sync: {}",
            zone.name, zone.provider_id, e
        );
        self.events.emit(EngineEvent::SyncInconsistent {
            zone: zone.provider_id.clone(),
            error: e.to_string(),
        });
        Error::inconsistent(zone.provider_id.clone(), e.to_string())
    }

    async fn active_zone(&self, zone_id: ZoneId) -> Result<HostedZone> {
        match self.store.get_zone(zone_id).await? {
            Some(zone) if zone.is_active() => Ok(zone),
            Some(_) => Err(Error::not_found(format!("zone {} is deleted", zone_id))),
            None => Err(Error::not_found(format!("zone {}", zone_id))),
        }
    }
}
