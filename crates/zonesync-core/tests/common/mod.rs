//! Test doubles and common utilities for contract tests
//!
//! `ScriptedProvider` keeps an in-memory model of a provider account. Tests
//! seed zones and record sets, inject failures per call (optionally per
//! zone), and read call counters afterwards.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, mpsc};
use zonesync_core::config::EngineConfig;
use zonesync_core::error::{Error, Result};
use zonesync_core::model::{RecordKind, StateFilter, ZoneId};
use zonesync_core::traits::{
    ChangeAction, ChangeRequest, ChangeStatus, CreatedZone, ProviderZone, RecordSet, RecordStore,
    ZoneProvider,
};
use zonesync_core::{EngineEvent, MemoryRecordStore, ZoneSyncEngine};

pub const PROVIDER_NAME: &str = "scripted";

/// Nameservers assigned to every zone created through the provider
pub const DELEGATION_SET: [&str; 4] = [
    "ns-101.awsdns-12.com.",
    "ns-202.awsdns-25.net.",
    "ns-1303.awsdns-34.org.",
    "ns-1804.awsdns-33.co.uk.",
];

/// Provider calls that can be counted or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ListZones,
    CreateZone,
    DeleteZone,
    GetZone,
    ListRecordSets,
    SubmitChange,
    GetChangeStatus,
}

/// Injected failure
#[derive(Debug, Clone)]
pub enum Failure {
    /// Transport-level failure
    Unavailable,
    /// Provider refusal with the given code
    Rejected(&'static str),
    /// Never answer; only a timeout ends the call
    Hang,
}

#[derive(Debug, Clone)]
struct ScriptedZone {
    name: String,
    sets: Vec<RecordSet>,
}

#[derive(Default)]
struct Script {
    zones: BTreeMap<String, ScriptedZone>,
    changes: HashMap<String, ChangeStatus>,
    failures: HashMap<Call, Failure>,
    zone_failures: HashMap<(Call, String), Failure>,
    calls: HashMap<Call, usize>,
    submitted: Vec<(String, ChangeRequest)>,
    next_zone: usize,
    next_change: usize,
    create_gate: Option<CreateGate>,
}

/// Holds `create_zone` after the zone exists but before the call returns
#[derive(Clone, Default)]
pub struct CreateGate {
    /// Notified once the zone has been created
    pub reached: Arc<Notify>,
    /// Notify to let the call return
    pub release: Arc<Notify>,
}

/// A provider double backed by a shared in-memory account
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that shares account state and counters with another
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
        }
    }

    /// Seed a zone
    pub fn add_zone(&self, id: &str, name: &str) {
        self.script.lock().unwrap().zones.insert(
            id.to_string(),
            ScriptedZone {
                name: name.to_string(),
                sets: Vec::new(),
            },
        );
    }

    /// Seed a record set into a zone
    pub fn add_record_set(&self, zone_id: &str, name: &str, kind: RecordKind, ttl: u32, values: &[&str]) {
        let mut script = self.script.lock().unwrap();
        let zone = script.zones.get_mut(zone_id).expect("zone seeded first");
        zone.sets.push(RecordSet {
            name: name.to_string(),
            kind,
            ttl,
            values: values.iter().map(|v| v.to_string()).collect(),
        });
    }

    /// Rename a zone provider-side
    pub fn rename_zone(&self, zone_id: &str, name: &str) {
        let mut script = self.script.lock().unwrap();
        script.zones.get_mut(zone_id).expect("zone seeded first").name = name.to_string();
    }

    /// Drop a zone provider-side without going through the API
    pub fn remove_zone(&self, zone_id: &str) {
        self.script.lock().unwrap().zones.remove(zone_id);
    }

    /// Set the status the provider reports for a change
    pub fn set_change_status(&self, change_id: &str, status: ChangeStatus) {
        self.script
            .lock()
            .unwrap()
            .changes
            .insert(change_id.to_string(), status);
    }

    /// Fail every future call of a kind
    pub fn fail(&self, call: Call, failure: Failure) {
        self.script.lock().unwrap().failures.insert(call, failure);
    }

    /// Fail future calls of a kind that target one zone
    pub fn fail_zone(&self, zone_id: &str, call: Call, failure: Failure) {
        self.script
            .lock()
            .unwrap()
            .zone_failures
            .insert((call, zone_id.to_string()), failure);
    }

    /// Pause every future `create_zone` after the zone is created
    pub fn pause_after_create(&self) -> CreateGate {
        let gate = CreateGate::default();
        self.script.lock().unwrap().create_gate = Some(gate.clone());
        gate
    }

    /// Remove every injected failure
    pub fn heal(&self) {
        let mut script = self.script.lock().unwrap();
        script.failures.clear();
        script.zone_failures.clear();
    }

    /// Number of times a call was made, failed or not
    pub fn calls(&self, call: Call) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .get(&call)
            .copied()
            .unwrap_or(0)
    }

    /// Every change submitted, with its zone id
    pub fn submitted(&self) -> Vec<(String, ChangeRequest)> {
        self.script.lock().unwrap().submitted.clone()
    }

    /// Record sets currently held for a zone
    pub fn record_sets(&self, zone_id: &str) -> Vec<RecordSet> {
        self.script
            .lock()
            .unwrap()
            .zones
            .get(zone_id)
            .map(|z| z.sets.clone())
            .unwrap_or_default()
    }

    pub fn has_zone(&self, zone_id: &str) -> bool {
        self.script.lock().unwrap().zones.contains_key(zone_id)
    }

    /// Count the call and resolve any injected failure for it
    async fn enter(&self, call: Call, zone_id: Option<&str>) -> Result<()> {
        let failure = {
            let mut script = self.script.lock().unwrap();
            *script.calls.entry(call).or_default() += 1;
            zone_id
                .and_then(|id| script.zone_failures.get(&(call, id.to_string())).cloned())
                .or_else(|| script.failures.get(&call).cloned())
        };

        match failure {
            None => Ok(()),
            Some(Failure::Unavailable) => Err(Error::unavailable(PROVIDER_NAME, "connection reset")),
            Some(Failure::Rejected(code)) => Err(Error::rejected(PROVIDER_NAME, format!("{}: scripted", code))),
            Some(Failure::Hang) => std::future::pending().await,
        }
    }

    fn create_zone_now(&self, name: &str) -> Result<(CreatedZone, Option<CreateGate>)> {
        let mut script = self.script.lock().unwrap();

        let name = if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{}.", name)
        };
        if script.zones.values().any(|z| z.name == name) {
            return Err(Error::rejected(PROVIDER_NAME, "HostedZoneAlreadyExists: scripted"));
        }

        script.next_zone += 1;
        let id = format!("ZNEW{:03}", script.next_zone);
        let nameservers: Vec<String> = DELEGATION_SET.iter().map(|ns| ns.to_string()).collect();
        let sets = vec![
            RecordSet {
                name: name.clone(),
                kind: RecordKind::Ns,
                ttl: 172800,
                values: nameservers.clone(),
            },
            RecordSet {
                name: name.clone(),
                kind: RecordKind::Soa,
                ttl: 900,
                values: vec![format!(
                    "{} awsdns-hostmaster.amazon.com. 1 7200 900 1209600 86400",
                    DELEGATION_SET[0]
                )],
            },
        ];
        script.zones.insert(
            id.clone(),
            ScriptedZone {
                name: name.clone(),
                sets,
            },
        );
        let change_id = Self::next_change(&mut script);

        let created = CreatedZone {
            id,
            name,
            delegation_nameservers: nameservers,
            change_id,
        };
        Ok((created, script.create_gate.clone()))
    }

    fn next_change(script: &mut Script) -> String {
        script.next_change += 1;
        let id = format!("C{:04}", script.next_change);
        script.changes.insert(id.clone(), ChangeStatus::Pending);
        id
    }
}

fn no_such_zone(zone_id: &str) -> Error {
    Error::rejected(PROVIDER_NAME, format!("NoSuchHostedZone: No hosted zone found with ID: {}", zone_id))
}

#[async_trait::async_trait]
impl ZoneProvider for ScriptedProvider {
    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        self.enter(Call::ListZones, None).await?;
        let script = self.script.lock().unwrap();
        Ok(script
            .zones
            .iter()
            .map(|(id, zone)| ProviderZone {
                id: id.clone(),
                name: zone.name.clone(),
            })
            .collect())
    }

    async fn create_zone(&self, name: &str) -> Result<CreatedZone> {
        self.enter(Call::CreateZone, None).await?;
        let (created, gate) = self.create_zone_now(name)?;
        if let Some(gate) = gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }
        Ok(created)
    }

    async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        self.enter(Call::DeleteZone, Some(zone_id)).await?;
        let mut script = self.script.lock().unwrap();
        script
            .zones
            .remove(zone_id)
            .map(|_| ())
            .ok_or_else(|| no_such_zone(zone_id))
    }

    async fn get_zone(&self, zone_id: &str) -> Result<ProviderZone> {
        self.enter(Call::GetZone, Some(zone_id)).await?;
        let script = self.script.lock().unwrap();
        script
            .zones
            .get(zone_id)
            .map(|zone| ProviderZone {
                id: zone_id.to_string(),
                name: zone.name.clone(),
            })
            .ok_or_else(|| no_such_zone(zone_id))
    }

    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        self.enter(Call::ListRecordSets, Some(zone_id)).await?;
        let script = self.script.lock().unwrap();
        script
            .zones
            .get(zone_id)
            .map(|zone| zone.sets.clone())
            .ok_or_else(|| no_such_zone(zone_id))
    }

    async fn submit_change(&self, zone_id: &str, change: &ChangeRequest) -> Result<String> {
        self.enter(Call::SubmitChange, Some(zone_id)).await?;
        let mut script = self.script.lock().unwrap();
        let zone = script
            .zones
            .get_mut(zone_id)
            .ok_or_else(|| no_such_zone(zone_id))?;

        let set = RecordSet {
            name: change.name.clone(),
            kind: change.kind,
            ttl: change.ttl,
            values: change.values.clone(),
        };
        match change.action {
            ChangeAction::Create => {
                if zone
                    .sets
                    .iter()
                    .any(|s| s.name == set.name && s.kind == set.kind)
                {
                    return Err(Error::rejected(
                        PROVIDER_NAME,
                        "InvalidChangeBatch: record set already exists",
                    ));
                }
                zone.sets.push(set);
            }
            ChangeAction::Delete => {
                let before = zone.sets.len();
                zone.sets.retain(|s| s != &set);
                if zone.sets.len() == before {
                    return Err(Error::rejected(
                        PROVIDER_NAME,
                        "InvalidChangeBatch: record set not found",
                    ));
                }
            }
        }

        script.submitted.push((zone_id.to_string(), change.clone()));
        Ok(Self::next_change(&mut script))
    }

    async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus> {
        self.enter(Call::GetChangeStatus, None).await?;
        let script = self.script.lock().unwrap();
        script.changes.get(change_id).copied().ok_or_else(|| {
            Error::rejected(PROVIDER_NAME, format!("NoSuchChange: {}", change_id))
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Engine settings for tests: short provider timeout, small channel
pub fn test_config() -> EngineConfig {
    EngineConfig {
        provider_timeout_secs: 2,
        sync_interval_secs: 60,
        event_channel_capacity: 100,
        ..EngineConfig::default()
    }
}

/// Build an engine over a memory store that the test can inspect
pub fn engine_with(
    provider: &ScriptedProvider,
) -> (ZoneSyncEngine, MemoryRecordStore, mpsc::Receiver<EngineEvent>) {
    let store = MemoryRecordStore::new();
    let (engine, events) = ZoneSyncEngine::new(
        Arc::new(ScriptedProvider::sharing_state_with(provider)),
        Arc::new(store.clone()),
        test_config(),
    )
    .expect("engine construction succeeds");
    (engine, store, events)
}

/// Comparable shape of a record: name, kind, ttl, values
pub type Signature = (String, RecordKind, u32, Vec<String>);

/// Sorted signatures of a zone's active records
pub async fn active_signatures(store: &impl RecordStore, zone_id: ZoneId) -> Vec<Signature> {
    let mut signatures: Vec<Signature> = store
        .list_records(zone_id, StateFilter::Active)
        .await
        .expect("list records")
        .into_iter()
        .map(|r| {
            let values = r.value_strings();
            (r.name, r.kind, r.ttl, values)
        })
        .collect();
    signatures.sort();
    signatures
}

/// Drain every event currently queued
pub fn drain(events: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
