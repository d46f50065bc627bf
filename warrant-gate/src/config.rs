//! Provider configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the client key.
pub const ENV_CLIENT_KEY: &str = "WARRANT_CLIENT_KEY";
/// Environment variable overriding the service endpoint.
pub const ENV_ENDPOINT: &str = "WARRANT_ENDPOINT";
/// Environment variable selecting a file for the persisted session token.
pub const ENV_STORAGE_PATH: &str = "WARRANT_STORAGE_PATH";

/// Settings for a [`crate::WarrantProvider`].
///
/// ```rust
/// use warrant_gate::ProviderConfig;
///
/// let config: ProviderConfig = serde_json::from_str(
///     r#"{"clientKey": "client_test_123", "endpoint": "http://localhost:8000"}"#,
/// ).unwrap();
/// assert_eq!(config.client_key, "client_test_123");
/// assert!(config.storage_path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub client_key: String,

    /// Override for the authorization service endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Persist the session token to this file. In-memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl ProviderConfig {
    pub fn new(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            endpoint: None,
            storage_path: None,
        }
    }

    /// Load from `WARRANT_CLIENT_KEY`, `WARRANT_ENDPOINT` and
    /// `WARRANT_STORAGE_PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_key = lookup(ENV_CLIENT_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} environment variable not set", ENV_CLIENT_KEY))
            })?;

        Ok(Self {
            client_key,
            endpoint: lookup(ENV_ENDPOINT).filter(|v| !v.is_empty()),
            storage_path: lookup(ENV_STORAGE_PATH)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }
}
