//! Common test utilities shared across test files.
//!
//! This module provides an authorization client with scripted answers and a
//! navigator that records redirects.
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use warrant_gate::{
    AuthorizationClient, Check, CheckMany, CheckOp, ClientError, ClientSession, FeatureCheck,
    Navigator, PermissionCheck, RedirectMode, WarrantEvent, WarrantHook,
};

// ===== Scripted Authorization Client =====

/// Answers checks from a table keyed by `object_type:object_id#relation`,
/// `permission:<id>` and `feature:<id>`. Unknown keys are denied.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    answers: Arc<Mutex<HashMap<String, bool>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(self, object_type: &str, object_id: &str, relation: &str, allow: bool) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(relation_key(object_type, object_id, relation), allow);
        self
    }

    pub fn permission(self, permission_id: &str, allow: bool) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(format!("permission:{}", permission_id), allow);
        self
    }

    pub fn feature(self, feature_id: &str, allow: bool) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(format!("feature:{}", feature_id), allow);
        self
    }

    /// Keys of every call made, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer(&self, key: String) -> bool {
        let allow = self
            .answers
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or(false);
        self.calls.lock().unwrap().push(key);
        allow
    }

    fn lookup(&self, check: &Check) -> bool {
        self.answers
            .lock()
            .unwrap()
            .get(&relation_key(
                &check.object_type,
                &check.object_id,
                &check.relation,
            ))
            .copied()
            .unwrap_or(false)
    }
}

fn relation_key(object_type: &str, object_id: &str, relation: &str) -> String {
    format!("{}:{}#{}", object_type, object_id, relation)
}

#[async_trait]
impl AuthorizationClient for ScriptedClient {
    async fn check(&self, _session: &ClientSession, check: &Check) -> Result<bool, ClientError> {
        Ok(self.answer(relation_key(
            &check.object_type,
            &check.object_id,
            &check.relation,
        )))
    }

    async fn check_many(
        &self,
        _session: &ClientSession,
        check: &CheckMany,
    ) -> Result<bool, ClientError> {
        let results: Vec<bool> = check.warrants.iter().map(|w| self.lookup(w)).collect();
        let op = check.op.unwrap_or(CheckOp::AllOf);
        self.calls
            .lock()
            .unwrap()
            .push(format!("batch:{}:{}", op, results.len()));
        Ok(match op {
            CheckOp::AllOf => results.iter().all(|r| *r),
            CheckOp::AnyOf => results.iter().any(|r| *r),
        })
    }

    async fn has_permission(
        &self,
        _session: &ClientSession,
        check: &PermissionCheck,
    ) -> Result<bool, ClientError> {
        Ok(self.answer(format!("permission:{}", check.permission_id)))
    }

    async fn has_feature(
        &self,
        _session: &ClientSession,
        check: &FeatureCheck,
    ) -> Result<bool, ClientError> {
        Ok(self.answer(format!("feature:{}", check.feature_id)))
    }
}

/// A client whose service is always down.
pub struct UnavailableClient;

#[async_trait]
impl AuthorizationClient for UnavailableClient {
    async fn check(&self, _: &ClientSession, _: &Check) -> Result<bool, ClientError> {
        Err(ClientError::ServiceUnavailable("maintenance".into()))
    }

    async fn check_many(&self, _: &ClientSession, _: &CheckMany) -> Result<bool, ClientError> {
        Err(ClientError::ServiceUnavailable("maintenance".into()))
    }

    async fn has_permission(
        &self,
        _: &ClientSession,
        _: &PermissionCheck,
    ) -> Result<bool, ClientError> {
        Err(ClientError::ServiceUnavailable("maintenance".into()))
    }

    async fn has_feature(&self, _: &ClientSession, _: &FeatureCheck) -> Result<bool, ClientError> {
        Err(ClientError::ServiceUnavailable("maintenance".into()))
    }
}

// ===== Navigation =====

/// Records every redirect a guard performs
#[derive(Clone, Default)]
pub struct NavigationLog {
    entries: Arc<Mutex<Vec<(String, RedirectMode)>>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, RedirectMode)> {
        self.entries.lock().unwrap().clone()
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, to: &str, mode: RedirectMode) {
        self.entries.lock().unwrap().push((to.to_string(), mode));
    }
}

// ===== Event Collector =====

/// Collects event types as strings for simple verification
#[derive(Clone, Default)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl WarrantHook for EventCollector {
    fn on_event(&self, event: &WarrantEvent) {
        self.events.lock().unwrap().push(event.name().to_string());
    }
}
