// # Zone Provider Trait
//
// Defines the interface to a hosted DNS provider's zone and record API.
//
// ## Implementations
//
// - Route 53: `zonesync-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::ZoneProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* ZoneProvider implementation */;
//
//     for zone in provider.list_zones().await? {
//         let sets = provider.list_record_sets(&zone.id).await?;
//         println!("{} has {} record sets", zone.name, sets.len());
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::RecordKind;

/// A zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderZone {
    /// Provider zone id, without any path prefix
    pub id: String,
    /// Zone name as the provider reports it
    pub name: String,
}

/// Result of creating a zone at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedZone {
    /// New provider zone id
    pub id: String,
    /// Zone name as normalized by the provider
    pub name: String,
    /// Nameservers of the delegation set assigned to the zone
    pub delegation_nameservers: Vec<String>,
    /// Change id of the asynchronous zone creation
    pub change_id: String,
}

/// A resource record set: one name+kind+ttl with one or more values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    pub name: String,
    pub kind: RecordKind,
    pub ttl: u32,
    pub values: Vec<String>,
}

/// Action of a submitted record change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Delete,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-record-set change submitted to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub action: ChangeAction,
    pub name: String,
    pub kind: RecordKind,
    pub ttl: u32,
    pub values: Vec<String>,
    /// Attribution comment attached to the change batch
    pub comment: String,
}

/// Propagation status of a change, in the provider's vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    /// Not yet applied to all authoritative servers
    #[serde(rename = "PENDING")]
    Pending,
    /// Applied everywhere
    #[serde(rename = "INSYNC")]
    InSync,
}

impl ChangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Pending => "PENDING",
            ChangeStatus::InSync => "INSYNC",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ChangeStatus::Pending),
            "INSYNC" => Ok(ChangeStatus::InSync),
            other => Err(crate::Error::invalid_input(format!(
                "Unknown change status: {}",
                other
            ))),
        }
    }
}

/// Trait for hosted DNS provider implementations
///
/// Every method is a single authenticated call (plus pagination for the
/// list methods). Implementations must be thread-safe and usable across
/// async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (callers own retry policy)
/// - ❌ Access the record store
/// - ❌ Cache zone or record state between calls
/// - ❌ Spawn tasks or threads
///
/// Errors must be reported as [`crate::Error::ProviderUnavailable`] for
/// transport/auth/throttling failures and [`crate::Error::ProviderRejected`]
/// when the provider refused the request.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// List every hosted zone in the account
    async fn list_zones(&self) -> Result<Vec<ProviderZone>, crate::Error>;

    /// Create a hosted zone
    ///
    /// # Returns
    ///
    /// The new zone id, its delegation nameservers and the change id of
    /// the creation.
    async fn create_zone(&self, name: &str) -> Result<CreatedZone, crate::Error>;

    /// Delete a hosted zone
    ///
    /// The provider returns no trackable change for this call.
    async fn delete_zone(&self, zone_id: &str) -> Result<(), crate::Error>;

    /// Fetch a single zone (names may change provider-side)
    async fn get_zone(&self, zone_id: &str) -> Result<ProviderZone, crate::Error>;

    /// Fetch every record set of a zone
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>, crate::Error>;

    /// Submit a one-change batch
    ///
    /// # Returns
    ///
    /// The change id of the submitted batch
    async fn submit_change(
        &self,
        zone_id: &str,
        change: &ChangeRequest,
    ) -> Result<String, crate::Error>;

    /// Poll the propagation status of a change
    async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone providers from configuration
pub trait ZoneProviderFactory: Send + Sync {
    /// Create a ZoneProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneProvider>, crate::Error>;
}
