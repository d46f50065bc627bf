//! # Warrant Gate
//!
//! Authorization-gated views, route guards and session handling for the
//! Warrant authorization service.
//!
//! A [`WarrantProvider`] is configured once with a client key and an
//! [`AuthorizationClient`], then mounted into a [`WarrantContext`]. Consumers
//! built from the context decide what to render:
//!
//! - [`ProtectedComponent`] renders its children only when access is granted
//! - [`ProtectedRoute`] renders a route's view or redirects denied users
//! - [`with_check`] wraps any view factory with the same guard behavior
//!
//! Every consumer owns a [`Gate`], which re-evaluates when the session token
//! or the check changes and drops results that arrive after newer inputs.
//!
//! ## Quick Start
//!
//! ```rust
//! use warrant_gate::{
//!     AuthorizationClient, Check, CheckMany, ClientError, ClientSession, FeatureCheck,
//!     PermissionCheck, ProtectedComponent, Rendered, WarrantProvider,
//! };
//!
//! struct BillingViewers;
//!
//! #[async_trait::async_trait]
//! impl AuthorizationClient for BillingViewers {
//!     async fn check(&self, _: &ClientSession, _: &Check) -> Result<bool, ClientError> {
//!         Ok(false)
//!     }
//!     async fn check_many(&self, _: &ClientSession, _: &CheckMany) -> Result<bool, ClientError> {
//!         Ok(false)
//!     }
//!     async fn has_permission(
//!         &self,
//!         _: &ClientSession,
//!         check: &PermissionCheck,
//!     ) -> Result<bool, ClientError> {
//!         Ok(check.permission_id == "billing:view")
//!     }
//!     async fn has_feature(&self, _: &ClientSession, _: &FeatureCheck) -> Result<bool, ClientError> {
//!         Ok(false)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let context = WarrantProvider::new("client_test_123", BillingViewers).mount();
//!
//! let billing = ProtectedComponent::permission(&context, "billing:view")?;
//!
//! // Nothing renders until a session token is set
//! assert!(billing.render(|| "billing panel").await?.is_nothing());
//!
//! context.set_token("session-token-from-login")?;
//! assert_eq!(billing.render(|| "billing panel").await?, Rendered::View("billing panel"));
//! # Ok::<(), warrant_gate::Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Route Guards
//!
//! Relation checks on a route can name a path parameter with `:name`:
//!
//! ```ignore
//! let route = ProtectedRoute::new(
//!     &context,
//!     GuardOptions::warrant("store", ":storeId", "owner", "/login"),
//!     |to: &str, _mode: RedirectMode| router.go(to),
//! )?;
//!
//! route.render(&matched_route, |m| store_page(m)).await?;
//! ```
//!
//! ## Errors
//!
//! Service failures and malformed checks are returned as [`Error`] values
//! and never treated as a denial. See [`Error`] for the categories.
//!
//! ## Features
//!
//! - `test-utils`: [`test_utils`] with mock and held clients, a recording navigator
//!   and an event collector

pub mod check;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod guard;
pub mod provider;
pub mod route;
pub mod session;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use check::{Check, CheckDescriptor, CheckMany, CheckOp, FeatureCheck, PermissionCheck};
pub use client::{AuthorizationClient, ClientError, ClientSession, DEFAULT_ENDPOINT};
pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use events::{WarrantEvent, WarrantHook};
pub use gate::{Decision, Gate};
pub use guard::{
    with_check, GuardOptions, Navigator, ProtectedComponent, ProtectedRoute, RedirectMode,
    Rendered, WithCheck,
};
pub use provider::{WarrantContext, WarrantProvider};
pub use route::{substitute_params, ParamResolver, RouteMatch};
pub use session::SessionStore;
pub use storage::{
    FileTokenStorage, MemoryTokenStorage, StorageError, TokenStorage, SESSION_TOKEN_KEY,
};
