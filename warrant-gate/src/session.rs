//! Session token store.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;

use crate::storage::{StorageError, TokenStorage, SESSION_TOKEN_KEY};

/// Holds the current session token and writes it through to durable storage.
///
/// An empty token means "not ready": gates stay pending and the facade
/// refuses to call the service. Every change is published to subscribers so
/// active gates can re-evaluate.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    sender: watch::Sender<String>,
}

impl SessionStore {
    /// Rehydrate from storage.
    ///
    /// A missing slot leaves the token empty. A storage read failure is logged
    /// and also leaves the token empty; the host can still call
    /// [`SessionStore::set_token`].
    pub fn load(storage: Arc<dyn TokenStorage>) -> Self {
        let token = match storage.get(SESSION_TOKEN_KEY) {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read stored session token: {}", e);
                String::new()
            }
        };
        debug!("session store loaded, ready={}", !token.is_empty());

        let (sender, _) = watch::channel(token);
        Self { storage, sender }
    }

    pub fn token(&self) -> String {
        self.sender.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        !self.sender.borrow().is_empty()
    }

    /// Replace the token, persist it, and notify subscribers.
    ///
    /// The in-memory value is updated even if the write fails, so the current
    /// run reflects what the host asked for; the error reports that the value
    /// will not survive a reload.
    pub fn set_token(&self, token: impl Into<String>) -> Result<(), StorageError> {
        let token = token.into();
        self.sender.send_replace(token.clone());

        self.storage
            .set(SESSION_TOKEN_KEY, &token)
            .inspect_err(|e| warn!("Failed to persist session token: {}", e))
    }

    /// Receive every subsequent token change.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.sender.subscribe()
    }
}
