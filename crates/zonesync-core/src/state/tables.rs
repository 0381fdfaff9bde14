// # Record Tables
//
// Plain in-memory tables shared by the memory and file stores. All
// invariants of `RecordStore` are enforced here so both stores behave
// identically; the stores only add locking and persistence.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Error;
use crate::model::{
    Change, ChangeOwner, ChangeRowId, HostedZone, NewChange, NewRecord, NewZone, Record,
    RecordId, RecordValue, RowState, StateFilter, ZoneId,
};

/// Zone, record and change tables plus id counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    zones: BTreeMap<ZoneId, HostedZone>,
    records: BTreeMap<RecordId, Record>,
    changes: BTreeMap<ChangeRowId, Change>,
    next_zone_id: u64,
    next_record_id: u64,
    next_value_id: u64,
    next_change_id: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

impl Tables {
    pub(crate) fn insert_zone(&mut self, zone: NewZone) -> Result<HostedZone, Error> {
        if self
            .zones
            .values()
            .any(|existing| existing.provider_id == zone.provider_id)
        {
            return Err(Error::state_store(format!(
                "Provider zone id {} is already recorded",
                zone.provider_id
            )));
        }

        let row = HostedZone {
            id: next_id(&mut self.next_zone_id),
            provider_id: zone.provider_id,
            name: zone.name,
            created_by: zone.created_by,
            created_on: Utc::now(),
            state: RowState::Active,
        };
        self.zones.insert(row.id, row.clone());
        Ok(row)
    }

    pub(crate) fn get_zone(&self, id: ZoneId) -> Option<HostedZone> {
        self.zones.get(&id).cloned()
    }

    pub(crate) fn find_zone_by_provider_id(&self, provider_id: &str) -> Option<HostedZone> {
        self.zones
            .values()
            .find(|z| z.is_active() && z.provider_id == provider_id)
            .cloned()
    }

    pub(crate) fn find_zone_by_name(&self, name: &str) -> Option<HostedZone> {
        self.zones
            .values()
            .find(|z| z.is_active() && z.name == name)
            .cloned()
    }

    pub(crate) fn list_zones(&self, filter: StateFilter) -> Vec<HostedZone> {
        self.zones
            .values()
            .filter(|z| filter.admits(&z.state))
            .cloned()
            .collect()
    }

    pub(crate) fn rename_zone(&mut self, id: ZoneId, name: &str) -> Result<(), Error> {
        let zone = self
            .zones
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Zone {}", id)))?;
        zone.name = name.to_string();
        Ok(())
    }

    pub(crate) fn mark_zone_deleted(&mut self, id: ZoneId) -> Result<(), Error> {
        let zone = self
            .zones
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Zone {}", id)))?;
        if !zone.is_active() {
            return Ok(());
        }

        let state = RowState::deleted_now();
        zone.state = state;
        for record in self.records.values_mut() {
            if record.zone_id == id && record.is_active() {
                record.state = state;
            }
        }
        Ok(())
    }

    pub(crate) fn insert_record(&mut self, record: NewRecord) -> Result<Record, Error> {
        match self.zones.get(&record.zone_id) {
            Some(zone) if zone.is_active() => {}
            Some(_) => {
                return Err(Error::invalid_input(format!(
                    "Zone {} is deleted",
                    record.zone_id
                )));
            }
            None => return Err(Error::not_found(format!("Zone {}", record.zone_id))),
        }

        let values = record
            .values
            .into_iter()
            .map(|value| RecordValue {
                id: next_id(&mut self.next_value_id),
                value,
            })
            .collect();

        let row = Record {
            id: next_id(&mut self.next_record_id),
            zone_id: record.zone_id,
            name: record.name,
            kind: record.kind,
            ttl: record.ttl,
            values,
            created_by: record.created_by,
            created_on: Utc::now(),
            state: RowState::Active,
        };
        self.records.insert(row.id, row.clone());
        Ok(row)
    }

    pub(crate) fn get_record(&self, id: RecordId) -> Option<Record> {
        self.records.get(&id).cloned()
    }

    pub(crate) fn list_records(&self, zone_id: ZoneId, filter: StateFilter) -> Vec<Record> {
        self.records
            .values()
            .filter(|r| r.zone_id == zone_id && filter.admits(&r.state))
            .cloned()
            .collect()
    }

    pub(crate) fn mark_record_deleted(&mut self, id: RecordId) -> Result<(), Error> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Record {}", id)))?;
        if record.is_active() {
            record.state = RowState::deleted_now();
        }
        Ok(())
    }

    pub(crate) fn retire_zone_records(&mut self, zone_id: ZoneId) -> usize {
        let state = RowState::deleted_now();
        let mut retired = 0;
        for record in self.records.values_mut() {
            if record.zone_id == zone_id && record.is_active() {
                record.state = state;
                retired += 1;
            }
        }
        retired
    }

    pub(crate) fn insert_change(&mut self, change: NewChange) -> Result<Change, Error> {
        let owner_exists = match change.owner {
            ChangeOwner::Zone(id) => self.zones.contains_key(&id),
            ChangeOwner::Record(id) => self.records.contains_key(&id),
        };
        if !owner_exists {
            return Err(Error::not_found(format!("Change owner {:?}", change.owner)));
        }

        let row = Change {
            id: next_id(&mut self.next_change_id),
            change_id: change.change_id,
            owner: change.owner,
            created_on: Utc::now(),
        };
        self.changes.insert(row.id, row.clone());
        Ok(row)
    }

    pub(crate) fn get_change(&self, id: ChangeRowId) -> Option<Change> {
        self.changes.get(&id).cloned()
    }

    pub(crate) fn list_changes(&self, owner: ChangeOwner) -> Vec<Change> {
        self.changes
            .values()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect()
    }
}
