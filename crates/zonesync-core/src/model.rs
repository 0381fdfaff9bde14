//! Local row types for hosted zones, records and changes
//!
//! Rows are never removed by normal operation. Deletion moves a row to
//! [`RowState::Deleted`] and every "active" query filters on the state
//! explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Local (store-assigned) hosted zone id
pub type ZoneId = u64;

/// Local (store-assigned) record id
pub type RecordId = u64;

/// Local (store-assigned) change row id
pub type ChangeRowId = u64;

/// TTL applied when a record is created without one
pub const DEFAULT_TTL: u32 = 60;

/// Lifecycle state of a zone or record row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RowState {
    /// Live row, visible to active queries
    Active,
    /// Soft-deleted row kept for audit
    Deleted {
        /// When the row was retired
        at: DateTime<Utc>,
    },
}

impl RowState {
    /// Retire a row now
    pub fn deleted_now() -> Self {
        Self::Deleted { at: Utc::now() }
    }

    /// Whether the row is active
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Deletion timestamp, if retired
    pub fn deleted_on(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }
}

/// Filter applied to zone and record listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    /// Only rows in [`RowState::Active`]
    #[default]
    Active,
    /// Only retired rows
    Deleted,
    /// Every row
    All,
}

impl StateFilter {
    /// Check a row state against the filter
    pub fn admits(&self, state: &RowState) -> bool {
        match self {
            StateFilter::Active => state.is_active(),
            StateFilter::Deleted => !state.is_active(),
            StateFilter::All => true,
        }
    }
}

/// DNS record kind
///
/// The numeric codes are stable and stored by older tooling; the textual
/// names match the provider's record type vocabulary exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum RecordKind {
    A = 1,
    Aaaa = 2,
    Cname = 3,
    Mx = 4,
    Ns = 5,
    Ptr = 6,
    Soa = 7,
    Spf = 8,
    Srv = 9,
    Txt = 10,
}

impl RecordKind {
    /// Every supported kind, ordered by code
    pub const ALL: [RecordKind; 10] = [
        RecordKind::A,
        RecordKind::Aaaa,
        RecordKind::Cname,
        RecordKind::Mx,
        RecordKind::Ns,
        RecordKind::Ptr,
        RecordKind::Soa,
        RecordKind::Spf,
        RecordKind::Srv,
        RecordKind::Txt,
    ];

    /// Stable numeric code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Provider record type name
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Cname => "CNAME",
            RecordKind::Mx => "MX",
            RecordKind::Ns => "NS",
            RecordKind::Ptr => "PTR",
            RecordKind::Soa => "SOA",
            RecordKind::Spf => "SPF",
            RecordKind::Srv => "SRV",
            RecordKind::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::invalid_input(format!("Unsupported record kind: {}", s)))
    }
}

/// Hosted zone row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedZone {
    /// Local id
    pub id: ZoneId,
    /// Provider-assigned zone id, without any path prefix
    pub provider_id: String,
    /// Zone name as the provider reports it
    pub name: String,
    /// Actor that created the row
    pub created_by: String,
    pub created_on: DateTime<Utc>,
    #[serde(flatten)]
    pub state: RowState,
}

impl HostedZone {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// One value of a multi-valued record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValue {
    /// Local id
    pub id: u64,
    pub value: String,
}

/// Resource record row; one row per provider record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Local id
    pub id: RecordId,
    /// Owning zone (local id)
    pub zone_id: ZoneId,
    pub name: String,
    pub kind: RecordKind,
    pub ttl: u32,
    pub values: Vec<RecordValue>,
    pub created_by: String,
    pub created_on: DateTime<Utc>,
    #[serde(flatten)]
    pub state: RowState,
}

impl Record {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// The value strings in stored order
    pub fn value_strings(&self) -> Vec<String> {
        self.values.iter().map(|v| v.value.clone()).collect()
    }
}

/// What a tracked change was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "owner", content = "id", rename_all = "snake_case")]
pub enum ChangeOwner {
    /// Zone creation
    Zone(ZoneId),
    /// Record creation or deletion
    Record(RecordId),
}

/// A provider change-id recorded after a successful mutating call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Local id
    pub id: ChangeRowId,
    /// Provider change id, without any path prefix
    pub change_id: String,
    pub owner: ChangeOwner,
    pub created_on: DateTime<Utc>,
}

/// Fields for a zone row about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewZone {
    pub provider_id: String,
    pub name: String,
    pub created_by: String,
}

/// Fields for a record row about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub zone_id: ZoneId,
    pub name: String,
    pub kind: RecordKind,
    pub ttl: u32,
    pub values: Vec<String>,
    pub created_by: String,
}

/// Fields for a change row about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChange {
    pub change_id: String,
    pub owner: ChangeOwner,
}
