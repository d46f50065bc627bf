//! Provider and shared context.
//!
//! A [`WarrantProvider`] is configured once at the root of the application
//! and mounted into a [`WarrantContext`]. The context is a cheap, cloneable
//! handle that every consumer receives explicitly; there is no global.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use tokio::sync::watch;

use crate::check::{Check, CheckDescriptor, CheckMany, FeatureCheck, PermissionCheck};
use crate::client::{AuthorizationClient, ClientSession};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::events::{WarrantEvent, WarrantHook};
use crate::session::SessionStore;
use crate::storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

/// Root configuration for authorization-gated views.
///
/// ```ignore
/// use warrant_gate::{WarrantProvider, FileTokenStorage};
///
/// let context = WarrantProvider::new("client_test_123", my_client)
///     .with_endpoint("https://api.warrant.dev")
///     .with_storage(FileTokenStorage::new("token.json"))
///     .mount();
///
/// context.set_token(session_token_from_login)?;
/// ```
pub struct WarrantProvider {
    client_key: String,
    endpoint: Option<String>,
    storage: Arc<dyn TokenStorage>,
    client: Arc<dyn AuthorizationClient>,
    hooks: Vec<Arc<dyn WarrantHook>>,
}

impl WarrantProvider {
    /// Create a provider with in-memory token storage.
    pub fn new(client_key: impl Into<String>, client: impl AuthorizationClient + 'static) -> Self {
        Self::from_arc(client_key, Arc::new(client))
    }

    /// Create a provider from a shared client.
    pub fn from_arc(client_key: impl Into<String>, client: Arc<dyn AuthorizationClient>) -> Self {
        Self {
            client_key: client_key.into(),
            endpoint: None,
            storage: Arc::new(MemoryTokenStorage::new()),
            client,
            hooks: Vec::new(),
        }
    }

    /// Create a provider from loaded configuration.
    ///
    /// A configured `storage_path` selects [`FileTokenStorage`].
    pub fn from_config(config: ProviderConfig, client: impl AuthorizationClient + 'static) -> Self {
        let ProviderConfig {
            client_key,
            endpoint,
            storage_path,
        } = config;

        let mut provider = Self::new(client_key, client);
        provider.endpoint = endpoint;
        if let Some(path) = storage_path {
            provider = provider.with_storage(FileTokenStorage::new(path));
        }
        provider
    }

    /// Override the authorization service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use a custom durable storage for the session token.
    pub fn with_storage(self, storage: impl TokenStorage + 'static) -> Self {
        self.with_shared_storage(Arc::new(storage))
    }

    /// Use a shared durable storage for the session token.
    pub fn with_shared_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Register an event hook.
    pub fn with_hook(mut self, hook: impl WarrantHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Mount the provider, rehydrating the session token from storage.
    pub fn mount(self) -> WarrantContext {
        let session = SessionStore::load(self.storage);
        debug!(
            "mounted warrant provider (endpoint override: {})",
            self.endpoint.is_some()
        );

        WarrantContext {
            inner: Some(Arc::new(ContextInner {
                client_key: self.client_key,
                endpoint: self.endpoint,
                session,
                client: self.client,
                hooks: self.hooks,
                in_flight: AtomicUsize::new(0),
            })),
        }
    }
}

/// Handle to a mounted provider.
///
/// Clones share the same session token, client and loading counter. The
/// default value is an unmounted context on which every operation fails with
/// a configuration error.
#[derive(Clone, Default)]
pub struct WarrantContext {
    inner: Option<Arc<ContextInner>>,
}

struct ContextInner {
    client_key: String,
    endpoint: Option<String>,
    session: SessionStore,
    client: Arc<dyn AuthorizationClient>,
    hooks: Vec<Arc<dyn WarrantHook>>,
    in_flight: AtomicUsize,
}

impl ContextInner {
    fn client_session(&self) -> Result<ClientSession> {
        let session_token = self.session.token();
        if session_token.is_empty() {
            return Err(Error::no_session_token());
        }
        Ok(ClientSession {
            client_key: self.client_key.clone(),
            session_token,
            endpoint: self.endpoint.clone(),
        })
    }

    fn emit(&self, event: &WarrantEvent) {
        for hook in &self.hooks {
            hook.on_event(event);
        }
    }
}

/// Keeps the in-flight counter raised for the lifetime of one call.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WarrantContext {
    /// A context with no provider behind it.
    pub fn unmounted() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_some()
    }

    /// Fail with a configuration error unless a provider is mounted.
    pub fn ensure_mounted(&self) -> Result<()> {
        self.mounted().map(|_| ())
    }

    fn mounted(&self) -> Result<&Arc<ContextInner>> {
        self.inner.as_ref().ok_or_else(Error::not_mounted)
    }

    /// Client key the provider was configured with (empty when unmounted).
    pub fn client_key(&self) -> &str {
        self.inner
            .as_ref()
            .map(|inner| inner.client_key.as_str())
            .unwrap_or_default()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.inner.as_ref().and_then(|inner| inner.endpoint.as_deref())
    }

    /// Current session token (empty when not set or unmounted).
    pub fn token(&self) -> String {
        self.inner
            .as_ref()
            .map(|inner| inner.session.token())
            .unwrap_or_default()
    }

    /// Whether a non-empty session token is set.
    pub fn is_ready(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.session.is_ready())
    }

    /// Replace the session token and persist it.
    ///
    /// Every gate watching this context re-evaluates. A storage failure is
    /// returned after the in-memory token has already changed.
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let inner = self.mounted()?;
        let token = token.into();
        let ready = !token.is_empty();

        let result = inner.session.set_token(token);
        inner.emit(&WarrantEvent::TokenChanged { ready });
        result.map_err(Error::from)
    }

    /// Receive every subsequent token change.
    pub fn subscribe(&self) -> Result<watch::Receiver<String>> {
        Ok(self.mounted()?.session.subscribe())
    }

    /// True while any authorization call is outstanding. Advisory only.
    pub fn is_loading(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.in_flight.load(Ordering::SeqCst) > 0)
    }

    pub(crate) fn emit(&self, event: &WarrantEvent) {
        if let Some(inner) = &self.inner {
            inner.emit(event);
        }
    }

    /// Check a single relation.
    pub async fn check(&self, check: &Check) -> Result<bool> {
        self.evaluate(&CheckDescriptor::Relation(check.clone()))
            .await
    }

    /// Check a batch of relations.
    pub async fn check_many(&self, check: &CheckMany) -> Result<bool> {
        self.evaluate(&CheckDescriptor::Batch(check.clone())).await
    }

    pub async fn has_permission(&self, check: &PermissionCheck) -> Result<bool> {
        self.evaluate(&CheckDescriptor::Permission(check.clone()))
            .await
    }

    pub async fn has_feature(&self, check: &FeatureCheck) -> Result<bool> {
        self.evaluate(&CheckDescriptor::Feature(check.clone()))
            .await
    }

    /// Run whichever operation matches the descriptor's shape.
    ///
    /// Fails without calling the service when no provider is mounted, when the
    /// session token is empty, or when the descriptor is malformed. Service
    /// failures are returned as [`Error::Service`], never as `Ok(false)`.
    pub async fn evaluate(&self, descriptor: &CheckDescriptor) -> Result<bool> {
        let inner = self.mounted()?;
        let session = inner.client_session()?;
        descriptor.validate()?;

        let kind = descriptor.kind();
        let _loading = LoadingGuard::enter(&inner.in_flight);
        inner.emit(&WarrantEvent::CheckStarted { kind });
        debug!("{} check started", kind);
        let started = Instant::now();

        let result = match descriptor {
            CheckDescriptor::Relation(check) => inner.client.check(&session, check).await,
            CheckDescriptor::Batch(check) => inner.client.check_many(&session, check).await,
            CheckDescriptor::Permission(check) => {
                inner.client.has_permission(&session, check).await
            }
            CheckDescriptor::Feature(check) => inner.client.has_feature(&session, check).await,
        };

        let duration = started.elapsed();
        match result {
            Ok(authorized) => {
                debug!("{} check settled: authorized={}", kind, authorized);
                inner.emit(&WarrantEvent::CheckCompleted {
                    kind,
                    authorized,
                    duration,
                });
                Ok(authorized)
            }
            Err(e) => {
                debug!("{} check failed: {}", kind, e);
                inner.emit(&WarrantEvent::CheckFailed {
                    kind,
                    error: e.to_string(),
                    duration,
                });
                Err(e.into())
            }
        }
    }
}
