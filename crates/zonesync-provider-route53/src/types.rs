//! Route 53 REST API (2013-04-01) request and response bodies

use serde::{Deserialize, Serialize};

pub(crate) const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

// ============ Responses ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct HostedZoneXml {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HostedZones {
    #[serde(rename = "HostedZone", default)]
    pub items: Vec<HostedZoneXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListHostedZonesResponse {
    #[serde(default)]
    pub hosted_zones: HostedZones,
    pub is_truncated: bool,
    #[serde(default)]
    pub next_marker: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetHostedZoneResponse {
    pub hosted_zone: HostedZoneXml,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeInfo {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NameServers {
    #[serde(rename = "NameServer", default)]
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DelegationSet {
    #[serde(default)]
    pub name_servers: NameServers,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateHostedZoneResponse {
    pub hosted_zone: HostedZoneXml,
    pub change_info: ChangeInfo,
    pub delegation_set: DelegationSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeInfoResponse {
    pub change_info: ChangeInfo,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResourceRecordSets {
    #[serde(rename = "ResourceRecordSet", default)]
    pub items: Vec<ResourceRecordSetXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ListResourceRecordSetsResponse {
    #[serde(default)]
    pub resource_record_sets: ResourceRecordSets,
    pub is_truncated: bool,
    #[serde(default)]
    pub next_record_name: Option<String>,
    #[serde(default)]
    pub next_record_type: Option<String>,
    #[serde(default)]
    pub next_record_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

// ============ Shared ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResourceRecordXml {
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ResourceRecords {
    #[serde(rename = "ResourceRecord", default)]
    pub items: Vec<ResourceRecordXml>,
}

/// A record set; alias sets carry neither TTL nor records
///
/// Sets with a routing policy (weighted, latency, failover, geolocation)
/// are told apart by their `SetIdentifier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResourceRecordSetXml {
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_identifier: Option<String>,
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_records: Option<ResourceRecords>,
}

// ============ Requests ============

#[derive(Debug, Serialize)]
#[serde(rename = "CreateHostedZoneRequest", rename_all = "PascalCase")]
pub(crate) struct CreateHostedZoneRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    pub name: String,
    pub caller_reference: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeXml {
    pub action: &'static str,
    pub resource_record_set: ResourceRecordSetXml,
}

#[derive(Debug, Serialize)]
pub(crate) struct Changes {
    #[serde(rename = "Change")]
    pub items: Vec<ChangeXml>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ChangeBatch {
    pub comment: String,
    pub changes: Changes,
}

#[derive(Debug, Serialize)]
#[serde(rename = "ChangeResourceRecordSetsRequest", rename_all = "PascalCase")]
pub(crate) struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    pub change_batch: ChangeBatch,
}
