//! Error types for zonesync
//!
//! Provider failures are split into two kinds so callers can tell a
//! transient outage (retry later) from a refusal (fix the request).
//! Local lookups that miss return [`Error::NotFound`], which is never used
//! for a provider-side "not found".

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Transport, authentication, throttling or timeout failure talking to the provider.
    /// No local state was changed.
    #[error("Provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The provider answered and refused the request (duplicate zone,
    /// conflicting record set, unknown zone id, ...)
    #[error("Provider rejected request ({provider}): {message}")]
    ProviderRejected {
        /// Provider name
        provider: String,
        /// Provider's own message
        message: String,
    },

    /// Zone, record or change missing from the local store
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sync was interrupted after local records were retired.
    /// The zone has no active records until `sync` succeeds again.
    #[error("Zone {zone} left inconsistent: {message}")]
    Inconsistent {
        /// Provider zone id
        zone: String,
        /// Underlying failure
        message: String,
    },

    /// Record store errors
    #[error("Record store error: {0}")]
    StateStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider-unavailable error
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a provider-rejected error
    pub fn rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an inconsistency error for a zone
    pub fn inconsistent(zone: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inconsistent {
            zone: zone.into(),
            message: message.into(),
        }
    }

    /// Create a record store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether retrying the same call later might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. })
    }

    /// Whether this error came from the provider rather than local state
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::ProviderRejected { .. }
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
