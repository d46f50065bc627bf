//! Test utilities for warrant-gate.
//!
//! This module provides in-process authorization clients (scripted and
//! held), a navigator that records redirects and an event collector, so gates and guards can be
//! tested without a running authorization service.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! warrant-gate = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use warrant_gate::test_utils::MockClient;
//! use warrant_gate::{ProtectedComponent, Rendered, WarrantProvider};
//!
//! # async fn example() -> warrant_gate::Result<()> {
//! let client = MockClient::new().with_permission("billing:view", true);
//! let context = WarrantProvider::new("client_test", client).mount();
//! context.set_token("session-token")?;
//!
//! let component = ProtectedComponent::permission(&context, "billing:view")?;
//! assert_eq!(component.render(|| "billing").await?, Rendered::View("billing"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::check::{Check, CheckMany, CheckOp, FeatureCheck, PermissionCheck};
use crate::client::{AuthorizationClient, ClientError, ClientSession};
use crate::events::{WarrantEvent, WarrantHook};
use crate::guard::{Navigator, RedirectMode};

#[derive(Default)]
struct MockState {
    relations: HashMap<(String, String, String), bool>,
    permissions: HashMap<String, bool>,
    features: HashMap<String, bool>,
    failure: Option<String>,
    call_count: usize,
    last_session: Option<ClientSession>,
}

/// An authorization client answering from pre-programmed tables.
///
/// Anything not programmed is denied. Batches combine member answers with
/// their operator; a batch without one requires every member.
///
/// # Example
///
/// ```ignore
/// use warrant_gate::test_utils::MockClient;
///
/// let client = MockClient::new()
///     .with_relation("store", "1", "owner", true)
///     .with_feature("sso", false);
///
/// // Every call fails with a service error
/// let broken = MockClient::new().failing("503 from upstream");
/// ```
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    /// Create a mock client that denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relation(
        self,
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
        authorized: bool,
    ) -> Self {
        self.state.lock().relations.insert(
            (object_type.into(), object_id.into(), relation.into()),
            authorized,
        );
        self
    }

    pub fn with_permission(self, permission_id: impl Into<String>, authorized: bool) -> Self {
        self.state
            .lock()
            .permissions
            .insert(permission_id.into(), authorized);
        self
    }

    pub fn with_feature(self, feature_id: impl Into<String>, authorized: bool) -> Self {
        self.state
            .lock()
            .features
            .insert(feature_id.into(), authorized);
        self
    }

    /// Fail every call with a service error.
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.state.lock().failure = Some(message.into());
        self
    }

    /// Get the number of calls made, across all operations.
    pub fn call_count(&self) -> usize {
        self.state.lock().call_count
    }

    /// The session passed to the most recent call.
    pub fn last_session(&self) -> Option<ClientSession> {
        self.state.lock().last_session.clone()
    }

    /// Record the call and return the state, or the programmed failure.
    fn begin(
        &self,
        session: &ClientSession,
    ) -> Result<parking_lot::MutexGuard<'_, MockState>, ClientError> {
        let mut state = self.state.lock();
        state.call_count += 1;
        state.last_session = Some(session.clone());
        if let Some(message) = state.failure.clone() {
            return Err(ClientError::ServiceUnavailable(message));
        }
        Ok(state)
    }
}

fn relation_answer(state: &MockState, check: &Check) -> bool {
    state
        .relations
        .get(&(
            check.object_type.clone(),
            check.object_id.clone(),
            check.relation.clone(),
        ))
        .copied()
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl AuthorizationClient for MockClient {
    async fn check(&self, session: &ClientSession, check: &Check) -> Result<bool, ClientError> {
        let state = self.begin(session)?;
        Ok(relation_answer(&state, check))
    }

    async fn check_many(
        &self,
        session: &ClientSession,
        check: &CheckMany,
    ) -> Result<bool, ClientError> {
        let state = self.begin(session)?;
        let mut answers = check.warrants.iter().map(|w| relation_answer(&state, w));
        Ok(match check.op {
            Some(CheckOp::AnyOf) => answers.any(|a| a),
            Some(CheckOp::AllOf) | None => answers.all(|a| a),
        })
    }

    async fn has_permission(
        &self,
        session: &ClientSession,
        check: &PermissionCheck,
    ) -> Result<bool, ClientError> {
        let state = self.begin(session)?;
        Ok(state
            .permissions
            .get(&check.permission_id)
            .copied()
            .unwrap_or(false))
    }

    async fn has_feature(
        &self,
        session: &ClientSession,
        check: &FeatureCheck,
    ) -> Result<bool, ClientError> {
        let state = self.begin(session)?;
        Ok(state
            .features
            .get(&check.feature_id)
            .copied()
            .unwrap_or(false))
    }
}

/// Records every navigation a guard performs.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    navigations: Arc<Mutex<Vec<(String, RedirectMode)>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All navigations so far, oldest first.
    pub fn navigations(&self) -> Vec<(String, RedirectMode)> {
        self.navigations.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.navigations.lock().len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: &str, mode: RedirectMode) {
        self.navigations.lock().push((to.to_string(), mode));
    }
}

/// An authorization client whose answers are released by the test.
///
/// Each call looks up a held answer by key and waits for it. Keys are
/// `type:id#relation` for relations, `permission:<id>`, `feature:<id>` and
/// `batch` for batches. A call with no held answer fails.
///
/// ```ignore
/// let client = HeldClient::new();
/// let release = client.hold("permission:billing:view");
///
/// let (authorized, _) = tokio::join!(
///     context.has_permission(&PermissionCheck::new("billing:view")),
///     async { release.send(true).unwrap() },
/// );
/// ```
#[derive(Clone, Default)]
pub struct HeldClient {
    held: Arc<Mutex<HashMap<String, oneshot::Receiver<bool>>>>,
}

impl HeldClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the answer for `key` until the returned sender fires.
    pub fn hold(&self, key: impl Into<String>) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().insert(key.into(), rx);
        tx
    }

    async fn answer(&self, key: String) -> Result<bool, ClientError> {
        let rx = self
            .held
            .lock()
            .remove(&key)
            .ok_or_else(|| ClientError::Other(format!("no held answer for {}", key)))?;
        rx.await
            .map_err(|_| ClientError::Network(format!("answer for {} dropped", key)))
    }
}

#[async_trait::async_trait]
impl AuthorizationClient for HeldClient {
    async fn check(&self, _session: &ClientSession, check: &Check) -> Result<bool, ClientError> {
        self.answer(format!(
            "{}:{}#{}",
            check.object_type, check.object_id, check.relation
        ))
        .await
    }

    async fn check_many(
        &self,
        _session: &ClientSession,
        _check: &CheckMany,
    ) -> Result<bool, ClientError> {
        self.answer("batch".to_string()).await
    }

    async fn has_permission(
        &self,
        _session: &ClientSession,
        check: &PermissionCheck,
    ) -> Result<bool, ClientError> {
        self.answer(format!("permission:{}", check.permission_id))
            .await
    }

    async fn has_feature(
        &self,
        _session: &ClientSession,
        check: &FeatureCheck,
    ) -> Result<bool, ClientError> {
        self.answer(format!("feature:{}", check.feature_id)).await
    }
}

/// Collects provider events for verification in tests.
///
/// ```ignore
/// let collector = EventCollector::new();
/// let context = WarrantProvider::new("client_test", MockClient::new())
///     .with_hook(collector.clone())
///     .mount();
///
/// context.set_token("session-token").unwrap();
/// assert_eq!(collector.event_types(), vec!["token_changed"]);
/// ```
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<WarrantEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WarrantEvent> {
        self.events.lock().clone()
    }

    /// Names of the collected events, oldest first.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(WarrantEvent::name).collect()
    }

    pub fn count_event(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }
}

impl WarrantHook for EventCollector {
    fn on_event(&self, event: &WarrantEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ClientSession {
        ClientSession {
            client_key: "client_key".to_string(),
            session_token: "tok1".to_string(),
            endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_mock_client_answers() {
        let client = MockClient::new()
            .with_relation("store", "1", "owner", true)
            .with_permission("billing:view", true)
            .with_feature("sso", true);

        assert!(client
            .check(&session(), &Check::new("store", "1", "owner"))
            .await
            .unwrap());
        assert!(!client
            .check(&session(), &Check::new("store", "2", "owner"))
            .await
            .unwrap());
        assert!(client
            .has_permission(&session(), &PermissionCheck::new("billing:view"))
            .await
            .unwrap());
        assert!(!client
            .has_feature(&session(), &FeatureCheck::new("audit-log"))
            .await
            .unwrap());
        assert_eq!(client.call_count(), 4);
        assert_eq!(client.last_session(), Some(session()));
    }

    #[tokio::test]
    async fn test_mock_client_batches() {
        let client = MockClient::new().with_relation("store", "1", "owner", true);
        let warrants = vec![
            Check::new("store", "1", "owner"),
            Check::new("store", "2", "owner"),
        ];

        assert!(client
            .check_many(&session(), &CheckMany::any_of(warrants.clone()))
            .await
            .unwrap());
        assert!(!client
            .check_many(&session(), &CheckMany::all_of(warrants))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_mock_client_failing() {
        let client = MockClient::new()
            .with_permission("billing:view", true)
            .failing("down");
        let err = client
            .has_permission(&session(), &PermissionCheck::new("billing:view"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate("/login", RedirectMode::Push);
        assert_eq!(navigator.count(), 1);
        assert_eq!(
            navigator.navigations(),
            vec![("/login".to_string(), RedirectMode::Push)]
        );
    }

    #[test]
    fn test_event_collector() {
        let collector = EventCollector::new();
        collector.on_event(&WarrantEvent::TokenChanged { ready: true });
        collector.on_event(&WarrantEvent::Redirected {
            to: "/login".to_string(),
            mode: RedirectMode::Push,
        });

        assert_eq!(collector.events().len(), 2);
        assert_eq!(collector.count_event("redirected"), 1);
        assert_eq!(collector.count_event("check_failed"), 0);
        assert_eq!(collector.event_types(), vec!["token_changed", "redirected"]);
    }

    #[tokio::test]
    async fn test_held_client_waits_for_release() {
        let client = HeldClient::new();
        let release = client.hold("feature:sso");

        let held_session = session();
        let feature_check = FeatureCheck::new("sso");
        let (authorized, _) = tokio::join!(
            client.has_feature(&held_session, &feature_check),
            async { release.send(true).unwrap() }
        );
        assert!(authorized.unwrap());

        // Nothing held for this key any more
        assert!(client
            .has_feature(&session(), &FeatureCheck::new("sso"))
            .await
            .is_err());
    }
}
