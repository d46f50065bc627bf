//! The authorization client seam.
//!
//! This crate never talks to the authorization service directly. Hosts plug
//! in an [`AuthorizationClient`] (usually a thin adapter over the Warrant SDK)
//! and the provider hands it a [`ClientSession`] on every call.

use std::sync::Arc;

use crate::check::{Check, CheckMany, FeatureCheck, PermissionCheck};

/// Endpoint used by clients when the provider has no override.
pub const DEFAULT_ENDPOINT: &str = "https://api.warrant.dev";

/// Error types for authorization clients
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The session token or client key was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting or throttling
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network or connectivity issues
    #[error("Network error: {0}")]
    Network(String),

    /// Service unavailable or temporary issues
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service rejected the request shape
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other client-specific errors that don't fit above categories
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Returns true if the failure is transient.
    ///
    /// Informational only: the facade never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Network(_) | Self::ServiceUnavailable(_)
        )
    }
}

/// Credentials and endpoint for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub client_key: String,
    pub session_token: String,
    pub endpoint: Option<String>,
}

impl ClientSession {
    /// The endpoint override, or [`DEFAULT_ENDPOINT`].
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

/// Trait for authorization clients
///
/// Each method is a single round trip returning the service's boolean
/// decision. Implementations must surface transport and service failures as
/// errors rather than `Ok(false)`.
#[async_trait::async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Check a single relation.
    async fn check(&self, session: &ClientSession, check: &Check) -> Result<bool, ClientError>;

    /// Check a batch of relations combined by `check.op`.
    async fn check_many(
        &self,
        session: &ClientSession,
        check: &CheckMany,
    ) -> Result<bool, ClientError>;

    /// Check whether the session's subject holds a permission.
    async fn has_permission(
        &self,
        session: &ClientSession,
        check: &PermissionCheck,
    ) -> Result<bool, ClientError>;

    /// Check whether the session's subject has a feature.
    async fn has_feature(
        &self,
        session: &ClientSession,
        check: &FeatureCheck,
    ) -> Result<bool, ClientError>;
}

// Implement AuthorizationClient for Arc<dyn AuthorizationClient> to support dynamic dispatch
#[async_trait::async_trait]
impl AuthorizationClient for Arc<dyn AuthorizationClient> {
    async fn check(&self, session: &ClientSession, check: &Check) -> Result<bool, ClientError> {
        (**self).check(session, check).await
    }

    async fn check_many(
        &self,
        session: &ClientSession,
        check: &CheckMany,
    ) -> Result<bool, ClientError> {
        (**self).check_many(session, check).await
    }

    async fn has_permission(
        &self,
        session: &ClientSession,
        check: &PermissionCheck,
    ) -> Result<bool, ClientError> {
        (**self).has_permission(session, check).await
    }

    async fn has_feature(
        &self,
        session: &ClientSession,
        check: &FeatureCheck,
    ) -> Result<bool, ClientError> {
        (**self).has_feature(session, check).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(ClientError::RateLimited("slow down".into()).is_retryable());
        assert!(ClientError::Network("timeout".into()).is_retryable());
        assert!(ClientError::ServiceUnavailable("503".into()).is_retryable());

        assert!(!ClientError::Authentication("bad token".into()).is_retryable());
        assert!(!ClientError::InvalidRequest("bad op".into()).is_retryable());
        assert!(!ClientError::Other("?".into()).is_retryable());
    }

    #[test]
    fn test_session_endpoint_default() {
        let mut session = ClientSession {
            client_key: "client_key".into(),
            session_token: "tok1".into(),
            endpoint: None,
        };
        assert_eq!(session.endpoint(), DEFAULT_ENDPOINT);

        session.endpoint = Some("http://localhost:8000".into());
        assert_eq!(session.endpoint(), "http://localhost:8000");
    }
}
