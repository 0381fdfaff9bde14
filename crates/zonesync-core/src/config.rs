//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Attribution attached to every change batch submitted to the provider
pub const DEFAULT_CHANGE_COMMENT: &str = "Managed by zonesync";

/// Main zonesync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneSyncConfig {
    /// Zone provider configuration
    pub provider: ProviderConfig,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ZoneSyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.store.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Zone provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Amazon Route 53
    Route53 {
        /// AWS access key id
        access_key_id: String,
        /// AWS secret access key
        secret_access_key: String,
        /// Session token for temporary credentials
        #[serde(default)]
        session_token: Option<String>,
        /// API endpoint override (e.g. a local test double)
        #[serde(default)]
        endpoint: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53 {
                access_key_id,
                secret_access_key,
                endpoint,
                ..
            } => {
                if access_key_id.is_empty() {
                    return Err(crate::Error::config("Route 53 access key id cannot be empty"));
                }
                if secret_access_key.is_empty() {
                    return Err(crate::Error::config(
                        "Route 53 secret access key cannot be empty",
                    ));
                }
                if let Some(endpoint) = endpoint
                    && !endpoint.starts_with("https://")
                    && !endpoint.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Route 53 endpoint must be an http(s) URL. Got: {}",
                        endpoint
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Route53 {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            endpoint: None,
        }
    }
}

// Credentials stay out of logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Route53 {
                access_key_id,
                session_token,
                endpoint,
                ..
            } => f
                .debug_struct("Route53")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<REDACTED>")
                .field("session_token", &session_token.as_ref().map(|_| "<REDACTED>"))
                .field("endpoint", endpoint)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("File store path cannot be empty"))
            }
            StoreConfig::Custom { factory, .. } if factory.is_empty() => Err(
                crate::Error::config("Custom store factory cannot be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on a single provider call (in seconds)
    ///
    /// A call that exceeds it fails as `ProviderUnavailable`; its mutation
    /// is never assumed to have happened.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Comment attached to every submitted change batch
    #[serde(default = "default_change_comment")]
    pub change_comment: String,

    /// TTL for records created without one (in seconds)
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    /// Interval between reconciliation passes in daemon mode (in seconds)
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Actor recorded on rows created by reconciliation
    #[serde(default = "default_sync_actor")]
    pub sync_actor: String,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate engine settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.provider_timeout_secs == 0 {
            return Err(crate::Error::config("Provider timeout must be > 0"));
        }
        if self.sync_interval_secs == 0 {
            return Err(crate::Error::config("Sync interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.default_ttl == 0 {
            return Err(crate::Error::config("Default TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: default_provider_timeout_secs(),
            change_comment: default_change_comment(),
            default_ttl: default_ttl(),
            sync_interval_secs: default_sync_interval_secs(),
            sync_actor: default_sync_actor(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_change_comment() -> String {
    DEFAULT_CHANGE_COMMENT.to_string()
}

fn default_ttl() -> u32 {
    crate::model::DEFAULT_TTL
}

fn default_sync_interval_secs() -> u64 {
    300
}

fn default_sync_actor() -> String {
    "zonesync".to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}
