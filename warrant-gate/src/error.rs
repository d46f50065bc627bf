//! Top-level error types for warrant-gate
//!
//! Errors are flattened into the categories a host needs to act on:
//!
//! - [`Error::Config`] - No provider mounted, or no session token set when a
//!   check runs. Fix the wiring, not the request.
//! - [`Error::InvalidCheck`] - A malformed check descriptor. Raised before any
//!   network call.
//! - [`Error::MissingRouteParam`] - A route guard placeholder with no matching
//!   route parameter.
//! - [`Error::Service`] - The authorization service (or the transport to it)
//!   failed. Never turned into a denial.
//! - [`Error::Storage`] - The durable token slot could not be read or written.
//!
//! A denied decision is not an error; see [`crate::Decision`].

use thiserror::Error;

use crate::client::ClientError;
use crate::storage::StorageError;

/// Message used when a check runs before a session token was provided.
pub(crate) const NO_SESSION_TOKEN: &str = "No session token provided to Warrant. You may have \
     forgotten to call set_token with a valid session token to finish initializing Warrant.";

/// Message used when a consumer is built from an unmounted context.
pub(crate) const NOT_MOUNTED: &str = "You didn't mount a WarrantProvider for this context";

/// Top-level error type for warrant-gate operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (no provider mounted, no session token)
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed check descriptor
    #[error("invalid check: {0}")]
    InvalidCheck(String),

    /// A route placeholder had no matching parameter in the active route
    #[error("missing route parameter '{0}'")]
    MissingRouteParam(String),

    /// The authorization service or its transport failed
    #[error("authorization service error: {0}")]
    Service(#[from] ClientError),

    /// Durable token storage failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    pub(crate) fn no_session_token() -> Self {
        Self::Config(NO_SESSION_TOKEN.to_string())
    }

    pub(crate) fn not_mounted() -> Self {
        Self::Config(NOT_MOUNTED.to_string())
    }

    /// Returns true if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if the check descriptor (or its route parameters) was malformed
    pub fn is_invalid_check(&self) -> bool {
        matches!(self, Self::InvalidCheck(_) | Self::MissingRouteParam(_))
    }

    /// Returns true if the authorization service failed
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// Returns true if durable storage failed
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type for warrant-gate operations
pub type Result<T> = std::result::Result<T, Error>;
