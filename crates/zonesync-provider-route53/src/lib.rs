// # Route 53 Zone Provider
//
// This crate provides the Amazon Route 53 implementation of `ZoneProvider`.
//
// ## Implementation Status
//
// - ✅ One signed HTTP request per trait call (plus pagination for list calls)
// - ✅ AWS Signature Version 4, with optional session token
// - ✅ HTTP timeouts configured (10s connect, 30s total)
// - ✅ Error mapping: auth/throttling/5xx are unavailable, other 4xx are rejected
// - ✅ Alias and unsupported record sets are skipped when listing
// - ✅ Endpoint override for local test doubles
// - ❌ NO retry logic (callers own retry policy)
// - ❌ NO caching (state owned by the RecordStore)
// - ❌ NO background tasks
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (Zone Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTPS API calls to the Route 53 endpoint only
// - ✅ Parse Route 53 XML responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic
// - ❌ Access the record store
// - ❌ Cache state beyond a single call
//
// ## Security Requirements
//
// - Secret access key and session token NEVER appear in logs
// - Provider fails fast if credentials are empty
//
// ## API Reference
//
// - Route 53 API 2013-04-01: https://docs.aws.amazon.com/Route53/latest/APIReference/
// - List zones: GET `/2013-04-01/hostedzone`
// - Create zone: POST `/2013-04-01/hostedzone`
// - Get/Delete zone: GET/DELETE `/2013-04-01/hostedzone/{id}`
// - List record sets: GET `/2013-04-01/hostedzone/{id}/rrset`
// - Change record sets: POST `/2013-04-01/hostedzone/{id}/rrset`
// - Get change: GET `/2013-04-01/change/{id}`

mod error;
mod sign;
mod types;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::model::RecordKind;
use zonesync_core::traits::{
    ChangeRequest, ChangeStatus, CreatedZone, ProviderZone, RecordSet, ZoneProvider,
    ZoneProviderFactory,
};
use zonesync_core::{Error, Result};

use sign::Signer;
use types::*;

/// Provider name used in errors and registry lookups
pub const PROVIDER_NAME: &str = "route53";

/// Public Route 53 endpoint
pub const DEFAULT_ENDPOINT: &str = "https://route53.amazonaws.com";

/// Route 53 is a global service signed in us-east-1
const SIGNING_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "route53";

const API_VERSION: &str = "/2013-04-01";

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";
const CHANGE_PREFIX: &str = "/change/";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Route 53 zone provider
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Every failure is returned to the caller as
/// `ProviderUnavailable` or `ProviderRejected`; nothing is retried here.
pub struct Route53Provider {
    signer: Signer,

    /// Endpoint origin, e.g. `https://route53.amazonaws.com`
    origin: String,

    /// Path prefix of the endpoint (empty for the public endpoint)
    base_path: String,

    /// Value of the signed `host` header
    host: String,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the secret key and session token
impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("access_key_id", &self.signer.access_key_id())
            .field("secret_access_key", &"<REDACTED>")
            .field("endpoint", &format!("{}{}", self.origin, self.base_path))
            .finish()
    }
}

impl Route53Provider {
    /// Create a provider for the public Route 53 endpoint
    ///
    /// # Errors
    ///
    /// `Error::Config` if a credential is empty or the HTTP client cannot
    /// be built.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Result<Self> {
        Self::with_endpoint(
            access_key_id,
            secret_access_key,
            session_token,
            DEFAULT_ENDPOINT,
        )
    }

    /// Create a provider talking to a specific endpoint
    pub fn with_endpoint(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        endpoint: &str,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();

        if access_key_id.is_empty() {
            return Err(Error::config("Route 53 access key id cannot be empty"));
        }
        if secret_access_key.is_empty() {
            return Err(Error::config("Route 53 secret access key cannot be empty"));
        }

        let url = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid Route 53 endpoint {}: {}", endpoint, e)))?;
        let host_name = url
            .host_str()
            .ok_or_else(|| Error::config(format!("Route 53 endpoint has no host: {}", endpoint)))?;
        // Url::port() is None when the port is the scheme default
        let host = match url.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };
        let origin = url.origin().ascii_serialization();
        let base_path = url.path().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            signer: Signer::new(
                access_key_id,
                secret_access_key,
                session_token.filter(|t| !t.is_empty()),
                SIGNING_REGION,
                SIGNING_SERVICE,
            ),
            origin,
            base_path,
            host,
            client,
        })
    }

    /// Send one signed request and return the body of a successful response
    async fn call(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<String>,
    ) -> Result<String> {
        let path = format!("{}{}", self.base_path, path);
        let query = sign::canonical_query(params);
        let payload = body.as_deref().unwrap_or_default().as_bytes();
        let signed = self.signer.sign(
            method.as_str(),
            &self.host,
            &path,
            &query,
            payload,
            Utc::now(),
        );

        let mut url = format!("{}{}", self.origin, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        tracing::debug!(method = %method, path = %path, "Route 53 request");

        let mut request = self
            .client
            .request(method, &url)
            .header("x-amz-date", signed.amz_date)
            .header(AUTHORIZATION, signed.authorization);
        if let Some(token) = signed.security_token {
            request = request.header("x-amz-security-token", token);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/xml").body(body);
        }

        let response = request.send().await.map_err(error::transport)?;
        let status = response.status();
        let text = response.text().await.map_err(error::transport)?;

        if !status.is_success() {
            return Err(error::from_status(status, &text));
        }
        Ok(text)
    }

    async fn call_xml<T: DeserializeOwned>(
        &self,
        what: &str,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<String>,
    ) -> Result<T> {
        let text = self.call(method, path, params, body).await?;
        quick_xml::de::from_str(&text).map_err(|e| error::malformed(what, e))
    }
}

fn serialize<T: serde::Serialize>(what: &str, value: &T) -> Result<String> {
    quick_xml::se::to_string(value)
        .map_err(|e| Error::Other(format!("Failed to build {} request: {}", what, e)))
}

/// Strip the `/hostedzone/` or `/change/` path prefix from an id
fn strip_id(raw: &str, prefix: &str) -> String {
    raw.strip_prefix(prefix).unwrap_or(raw).to_string()
}

fn zone_path(zone_id: &str) -> String {
    format!("{}/hostedzone/{}", API_VERSION, sign::uri_encode(zone_id))
}

impl From<HostedZoneXml> for ProviderZone {
    fn from(zone: HostedZoneXml) -> Self {
        ProviderZone {
            id: strip_id(&zone.id, HOSTED_ZONE_PREFIX),
            name: zone.name,
        }
    }
}

/// Convert a listed record set, skipping what zonesync does not mirror
fn to_record_set(zone_id: &str, set: ResourceRecordSetXml) -> Option<RecordSet> {
    let kind = match set.kind.parse::<RecordKind>() {
        Ok(kind) => kind,
        Err(_) => {
            tracing::warn!(
                zone = %zone_id,
                name = %set.name,
                kind = %set.kind,
                "Skipping record set of unsupported type"
            );
            return None;
        }
    };

    if let Some(identifier) = &set.set_identifier {
        tracing::warn!(
            zone = %zone_id,
            name = %set.name,
            kind = %kind,
            set_identifier = %identifier,
            "Skipping record set with a routing policy"
        );
        return None;
    }

    let (Some(ttl), Some(records)) = (set.ttl, set.resource_records) else {
        tracing::debug!(zone = %zone_id, name = %set.name, kind = %kind, "Skipping alias record set");
        return None;
    };

    Some(RecordSet {
        name: set.name,
        kind,
        ttl,
        values: records.items.into_iter().map(|r| r.value).collect(),
    })
}

#[async_trait]
impl ZoneProvider for Route53Provider {
    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let path = format!("{}/hostedzone", API_VERSION);
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let params: Vec<(&str, String)> =
                marker.iter().map(|m| ("marker", m.clone())).collect();
            let page: ListHostedZonesResponse = self
                .call_xml("ListHostedZones", Method::GET, &path, &params, None)
                .await?;

            zones.extend(page.hosted_zones.items.into_iter().map(ProviderZone::from));

            match (page.is_truncated, page.next_marker) {
                (true, Some(next)) => marker = Some(next),
                _ => break,
            }
        }

        tracing::debug!(count = zones.len(), "Listed hosted zones");
        Ok(zones)
    }

    async fn create_zone(&self, name: &str) -> Result<CreatedZone> {
        let request = CreateHostedZoneRequest {
            xmlns: XMLNS,
            name: name.to_string(),
            caller_reference: uuid::Uuid::new_v4().to_string(),
        };
        let body = serialize("CreateHostedZone", &request)?;

        let created: CreateHostedZoneResponse = self
            .call_xml(
                "CreateHostedZone",
                Method::POST,
                &format!("{}/hostedzone", API_VERSION),
                &[],
                Some(body),
            )
            .await?;

        let zone = ProviderZone::from(created.hosted_zone);
        tracing::info!(zone = %zone.id, name = %zone.name, "Created hosted zone");

        Ok(CreatedZone {
            id: zone.id,
            name: zone.name,
            delegation_nameservers: created.delegation_set.name_servers.items,
            change_id: strip_id(&created.change_info.id, CHANGE_PREFIX),
        })
    }

    async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        self.call(Method::DELETE, &zone_path(zone_id), &[], None)
            .await?;
        tracing::info!(zone = %zone_id, "Deleted hosted zone");
        Ok(())
    }

    async fn get_zone(&self, zone_id: &str) -> Result<ProviderZone> {
        let resp: GetHostedZoneResponse = self
            .call_xml("GetHostedZone", Method::GET, &zone_path(zone_id), &[], None)
            .await?;
        Ok(resp.hosted_zone.into())
    }

    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        let path = format!("{}/rrset", zone_path(zone_id));
        let mut sets = Vec::new();
        let mut params: Vec<(&str, String)> = Vec::new();

        loop {
            let page: ListResourceRecordSetsResponse = self
                .call_xml("ListResourceRecordSets", Method::GET, &path, &params, None)
                .await?;

            sets.extend(
                page.resource_record_sets
                    .items
                    .into_iter()
                    .filter_map(|set| to_record_set(zone_id, set)),
            );

            if !page.is_truncated {
                break;
            }
            let Some(next_name) = page.next_record_name else {
                break;
            };
            params = vec![("name", next_name)];
            if let Some(next_type) = page.next_record_type {
                params.push(("type", next_type));
            }
            if let Some(next_identifier) = page.next_record_identifier {
                params.push(("identifier", next_identifier));
            }
        }

        tracing::debug!(zone = %zone_id, count = sets.len(), "Listed record sets");
        Ok(sets)
    }

    async fn submit_change(&self, zone_id: &str, change: &ChangeRequest) -> Result<String> {
        let request = ChangeResourceRecordSetsRequest {
            xmlns: XMLNS,
            change_batch: ChangeBatch {
                comment: change.comment.clone(),
                changes: Changes {
                    items: vec![ChangeXml {
                        action: change.action.as_str(),
                        resource_record_set: ResourceRecordSetXml {
                            name: change.name.clone(),
                            kind: change.kind.as_str().to_string(),
                            set_identifier: None,
                            ttl: Some(change.ttl),
                            resource_records: Some(ResourceRecords {
                                items: change
                                    .values
                                    .iter()
                                    .map(|value| ResourceRecordXml {
                                        value: value.clone(),
                                    })
                                    .collect(),
                            }),
                        },
                    }],
                },
            },
        };
        let body = serialize("ChangeResourceRecordSets", &request)?;

        let resp: ChangeInfoResponse = self
            .call_xml(
                "ChangeResourceRecordSets",
                Method::POST,
                &format!("{}/rrset", zone_path(zone_id)),
                &[],
                Some(body),
            )
            .await?;

        let change_id = strip_id(&resp.change_info.id, CHANGE_PREFIX);
        tracing::info!(
            zone = %zone_id,
            action = %change.action,
            name = %change.name,
            kind = %change.kind,
            change = %change_id,
            "Submitted record change"
        );
        Ok(change_id)
    }

    async fn get_change_status(&self, change_id: &str) -> Result<ChangeStatus> {
        let path = format!("{}/change/{}", API_VERSION, sign::uri_encode(change_id));
        let resp: ChangeInfoResponse = self
            .call_xml("GetChange", Method::GET, &path, &[], None)
            .await?;

        resp.change_info
            .status
            .parse::<ChangeStatus>()
            .map_err(|e| error::malformed("GetChange", e))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Route 53 providers
pub struct Route53Factory;

impl ZoneProviderFactory for Route53Factory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        match config {
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                session_token,
                endpoint,
            } => {
                let endpoint = endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
                if endpoint != DEFAULT_ENDPOINT {
                    tracing::warn!(endpoint = %endpoint, "Route 53 endpoint overridden");
                }
                Ok(Box::new(Route53Provider::with_endpoint(
                    access_key_id.clone(),
                    secret_access_key.clone(),
                    session_token.clone(),
                    endpoint,
                )?))
            }
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_route53::register(&registry);
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(Route53Factory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route53_config(access_key_id: &str, endpoint: Option<&str>) -> ProviderConfig {
        ProviderConfig::Route53 {
            access_key_id: access_key_id.to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
            session_token: None,
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_factory_creation() {
        let provider = Route53Factory.create(&route53_config("AKIDEXAMPLE", None));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().provider_name(), "route53");
    }

    #[test]
    fn test_factory_missing_key() {
        let result = Route53Factory.create(&route53_config("", None));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let config = ProviderConfig::Custom {
            factory: "other".to_string(),
            config: serde_json::json!({}),
        };
        assert!(Route53Factory.create(&config).is_err());
    }

    #[test]
    fn test_register() {
        let registry = zonesync_core::ProviderRegistry::new();
        register(&registry);
        assert!(registry.has_provider("route53"));
    }

    #[test]
    fn test_endpoint_host_keeps_explicit_port() {
        let provider =
            Route53Provider::with_endpoint("AKID", "secret", None, "http://127.0.0.1:8080/")
                .unwrap();
        assert_eq!(provider.host, "127.0.0.1:8080");
        assert_eq!(provider.origin, "http://127.0.0.1:8080");
        assert_eq!(provider.base_path, "");

        let provider = Route53Provider::new("AKID", "secret", None).unwrap();
        assert_eq!(provider.host, "route53.amazonaws.com");
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let result = Route53Provider::with_endpoint("AKID", "secret", None, "not a url");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let provider = Route53Provider::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG",
            Some("session-token-xyz".to_string()),
        )
        .unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("wJalrXUtnFEMI"));
        assert!(!debug_str.contains("session-token-xyz"));
        assert!(debug_str.contains("Route53Provider"));
        assert!(debug_str.contains("AKIDEXAMPLE"));
    }

    #[test]
    fn test_strip_id() {
        assert_eq!(strip_id("/hostedzone/Z123", HOSTED_ZONE_PREFIX), "Z123");
        assert_eq!(strip_id("/change/C456", CHANGE_PREFIX), "C456");
        assert_eq!(strip_id("Z123", HOSTED_ZONE_PREFIX), "Z123");
    }

    #[test]
    fn test_unsupported_alias_and_routed_sets_are_skipped() {
        let caa = ResourceRecordSetXml {
            name: "example.com.".to_string(),
            kind: "CAA".to_string(),
            set_identifier: None,
            ttl: Some(300),
            resource_records: Some(ResourceRecords {
                items: vec![ResourceRecordXml {
                    value: "0 issue \"amazon.com\"".to_string(),
                }],
            }),
        };
        assert!(to_record_set("Z1", caa).is_none());

        let alias = ResourceRecordSetXml {
            name: "www.example.com.".to_string(),
            kind: "A".to_string(),
            set_identifier: None,
            ttl: None,
            resource_records: None,
        };
        assert!(to_record_set("Z1", alias).is_none());

        let txt = ResourceRecordSetXml {
            name: "example.com.".to_string(),
            kind: "TXT".to_string(),
            set_identifier: None,
            ttl: Some(60),
            resource_records: Some(ResourceRecords {
                items: vec![ResourceRecordXml {
                    value: "\"v=spf1 -all\"".to_string(),
                }],
            }),
        };
        let weighted = ResourceRecordSetXml {
            name: "api.example.com.".to_string(),
            kind: "A".to_string(),
            set_identifier: Some("blue".to_string()),
            ttl: Some(60),
            resource_records: Some(ResourceRecords {
                items: vec![ResourceRecordXml {
                    value: "192.0.2.10".to_string(),
                }],
            }),
        };
        assert!(to_record_set("Z1", weighted).is_none());

        let set = to_record_set("Z1", txt).unwrap();
        assert_eq!(set.kind, RecordKind::Txt);
        assert_eq!(set.values, vec!["\"v=spf1 -all\""]);
    }
}
