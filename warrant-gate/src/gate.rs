//! The authorization gating state machine.
//!
//! Every consumer owns one [`Gate`]. A gate tracks the dependency pair
//! (session token, descriptor by value) it last evaluated and the
//! [`Decision`] for that pair:
//!
//! ```text
//! Pending --granted--> Granted
//!    |
//!    +----denied-----> Denied
//!
//! any state --(token or descriptor changed)--> Pending
//! ```
//!
//! Overlapping evaluations are ordered by a per-gate sequence number. A result
//! that settles after the pair has changed again is dropped, so the visible
//! decision always belongs to the most recent pair. The superseded caller sees
//! `Pending` and must not render from its own, older inputs.

use log::debug;
use parking_lot::Mutex;

use crate::check::CheckDescriptor;
use crate::error::{Error, Result};
use crate::events::WarrantEvent;
use crate::provider::WarrantContext;

/// Three-valued authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Decision {
    /// No answer yet (initial state, or waiting for a session token).
    #[default]
    Pending,
    Granted,
    Denied,
}

impl Decision {
    pub fn from_authorized(authorized: bool) -> Self {
        if authorized {
            Self::Granted
        } else {
            Self::Denied
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }
}

#[derive(Default)]
struct GateState {
    deps: Option<(String, CheckDescriptor)>,
    decision: Decision,
    sequence: u64,
    redirected: bool,
}

/// Re-evaluates one check whenever its inputs change.
pub struct Gate {
    context: WarrantContext,
    state: Mutex<GateState>,
}

impl Gate {
    pub fn new(context: WarrantContext) -> Self {
        Self {
            context,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn context(&self) -> &WarrantContext {
        &self.context
    }

    /// Decision for the current dependency pair.
    pub fn decision(&self) -> Decision {
        self.state.lock().decision
    }

    /// Number of times the dependency pair has changed.
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Bring the gate up to date with the current token and `descriptor`.
    ///
    /// Issues at most one authorization call per distinct pair. With an empty
    /// token the gate stays [`Decision::Pending`] and nothing is called.
    /// Malformed descriptors and service failures are returned as errors and
    /// leave the gate pending; they are never reported as
    /// [`Decision::Denied`]. After an error the pair is forgotten, so the next
    /// `sync` with the same inputs evaluates again.
    ///
    /// A caller whose evaluation was superseded while in flight gets
    /// [`Decision::Pending`], whatever the newer inputs resolved to.
    pub async fn sync(&self, descriptor: &CheckDescriptor) -> Result<Decision> {
        self.context.ensure_mounted()?;
        let token = self.context.token();

        let sequence = {
            let mut state = self.state.lock();
            if let Some((current_token, current)) = &state.deps {
                if *current_token == token && current == descriptor {
                    return Ok(state.decision);
                }
            }
            state.deps = Some((token.clone(), descriptor.clone()));
            state.decision = Decision::Pending;
            state.redirected = false;
            state.sequence += 1;
            state.sequence
        };

        if token.is_empty() {
            debug!("gate waiting for a session token");
            return Ok(Decision::Pending);
        }

        let result = self.context.evaluate(descriptor).await;

        let mut state = self.state.lock();
        if state.sequence != sequence {
            debug!(
                "discarding stale {} result (sequence {} superseded by {})",
                descriptor.kind(),
                sequence,
                state.sequence
            );
            self.context.emit(&WarrantEvent::StaleDiscarded {
                kind: descriptor.kind(),
                sequence,
            });
            // The current decision belongs to newer inputs than this caller's
            return Ok(Decision::Pending);
        }

        match result {
            Ok(authorized) => {
                state.decision = Decision::from_authorized(authorized);
                Ok(state.decision)
            }
            Err(e) => {
                state.deps = None;
                Err(e)
            }
        }
    }

    /// Follow token changes, calling `on_decision` after every evaluation.
    ///
    /// Evaluates once immediately, then again each time the provider's
    /// session token changes. Runs until the future is dropped or an
    /// evaluation fails.
    pub async fn watch<F>(&self, descriptor: &CheckDescriptor, mut on_decision: F) -> Result<()>
    where
        F: FnMut(Decision) + Send,
    {
        let mut tokens = self.context.subscribe()?;
        loop {
            drop(tokens.borrow_and_update());
            let decision = self.sync(descriptor).await?;
            on_decision(decision);

            if tokens.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    /// Claim the redirect for the current denied pair.
    ///
    /// Returns `true` exactly once per denied pair; guards use this to
    /// navigate away a single time no matter how often they render.
    pub fn take_redirect(&self) -> bool {
        let mut state = self.state.lock();
        if state.decision.is_denied() && !state.redirected {
            state.redirected = true;
            true
        } else {
            false
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Gate")
            .field("decision", &state.decision)
            .field("sequence", &state.sequence)
            .finish()
    }
}

/// Fails when a gate is built over a context with no provider.
pub(crate) fn mounted_gate(context: &WarrantContext) -> Result<Gate> {
    if !context.is_mounted() {
        return Err(Error::not_mounted());
    }
    Ok(Gate::new(context.clone()))
}
