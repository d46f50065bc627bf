use std::time::Duration;

use crate::guard::RedirectMode;

/// Events emitted by the provider, gates and guards
///
/// Session tokens are never included in events.
#[derive(Debug, Clone)]
pub enum WarrantEvent {
    // ===== Session =====
    /// `set_token` was called
    TokenChanged {
        /// Whether the new token is non-empty
        ready: bool,
    },

    // ===== Facade calls =====
    /// A call to the authorization client started
    CheckStarted {
        /// Descriptor shape ("relation", "permission", "feature", "batch")
        kind: &'static str,
    },

    /// A call settled with a decision
    CheckCompleted {
        kind: &'static str,
        authorized: bool,
        duration: Duration,
    },

    /// A call failed
    CheckFailed {
        kind: &'static str,
        error: String,
        duration: Duration,
    },

    // ===== Gates =====
    /// A gate dropped a result that settled after its inputs changed
    StaleDiscarded {
        kind: &'static str,
        /// Sequence number of the discarded evaluation
        sequence: u64,
    },

    /// A guard sent the user away after a denial
    Redirected { to: String, mode: RedirectMode },
}

impl WarrantEvent {
    /// Snake-case name of the variant, e.g. `"check_completed"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenChanged { .. } => "token_changed",
            Self::CheckStarted { .. } => "check_started",
            Self::CheckCompleted { .. } => "check_completed",
            Self::CheckFailed { .. } => "check_failed",
            Self::StaleDiscarded { .. } => "stale_discarded",
            Self::Redirected { .. } => "redirected",
        }
    }
}

/// Hook for observing provider events
///
/// # Example
/// ```
/// use warrant_gate::events::{WarrantEvent, WarrantHook};
///
/// struct Logger;
///
/// impl WarrantHook for Logger {
///     fn on_event(&self, event: &WarrantEvent) {
///         if let WarrantEvent::CheckFailed { kind, error, .. } = event {
///             eprintln!("{} check failed: {}", kind, error);
///         }
///     }
/// }
/// ```
pub trait WarrantHook: Send + Sync {
    /// Called when an event occurs
    fn on_event(&self, event: &WarrantEvent);
}

/// Blanket implementation for closures
impl<F> WarrantHook for F
where
    F: Fn(&WarrantEvent) + Send + Sync,
{
    fn on_event(&self, event: &WarrantEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_hook() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let hook = move |event: &WarrantEvent| {
            if matches!(event, WarrantEvent::CheckStarted { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        };

        hook.on_event(&WarrantEvent::CheckStarted { kind: "permission" });
        hook.on_event(&WarrantEvent::TokenChanged { ready: true });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(WarrantEvent::TokenChanged { ready: false }.name(), "token_changed");
        assert_eq!(
            WarrantEvent::StaleDiscarded {
                kind: "feature",
                sequence: 3
            }
            .name(),
            "stale_discarded"
        );
    }
}
