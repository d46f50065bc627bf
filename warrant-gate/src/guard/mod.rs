//! Consumers built on [`Gate`]: inline components, route guards and
//! wrapping guards.
//!
//! All three turn a [`Decision`] into a [`Rendered`] outcome:
//!
//! | Consumer | Pending / no token | Granted | Denied |
//! |----------|--------------------|---------|--------|
//! | [`ProtectedComponent`] | nothing | children | nothing |
//! | [`ProtectedRoute`] | nothing | route view | redirect |
//! | [`WithCheck`] | nothing | wrapped view | redirect |
//!
//! Guards navigate through a host-supplied [`Navigator`], once per denied
//! dependency pair.

mod component;
mod protected_route;
mod wrap;

pub use component::ProtectedComponent;
pub use protected_route::ProtectedRoute;
pub use wrap::{with_check, WithCheck};

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::check::{Check, CheckDescriptor, CheckMany, CheckOp};
use crate::events::WarrantEvent;
use crate::gate::{Decision, Gate};

/// How a guard leaves a denied view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RedirectMode {
    /// Declarative redirect: navigate to the target as a new location.
    #[default]
    Push,

    /// Replace the current history entry in place.
    Replace,
}

/// The routing collaborator's navigation capability.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: &str, mode: RedirectMode);
}

/// Blanket implementation for closures
impl<F> Navigator for F
where
    F: Fn(&str, RedirectMode) + Send + Sync,
{
    fn navigate(&self, to: &str, mode: RedirectMode) {
        self(to, mode)
    }
}

/// What a consumer renders for the current decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<V> {
    /// Access granted: the protected view.
    View(V),
    /// Nothing yet (pending) or nothing at all (inline component denied).
    Nothing,
    /// Access denied: the user was sent to this location.
    Redirected(String),
}

impl<V> Rendered<V> {
    pub fn is_view(&self) -> bool {
        matches!(self, Self::View(_))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    pub fn is_redirected(&self) -> bool {
        matches!(self, Self::Redirected(_))
    }

    pub fn view(&self) -> Option<&V> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }

    pub fn into_view(self) -> Option<V> {
        match self {
            Self::View(view) => Some(view),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Rendered<U> {
        match self {
            Self::View(view) => Rendered::View(f(view)),
            Self::Nothing => Rendered::Nothing,
            Self::Redirected(to) => Rendered::Redirected(to),
        }
    }
}

/// What a guard checks and where it sends denied users.
///
/// ```rust
/// use warrant_gate::GuardOptions;
///
/// let options: GuardOptions = serde_json::from_str(r#"{
///     "check": {"kind": "relation", "objectType": "store", "objectId": ":storeId", "relation": "owner"},
///     "redirectTo": "/login"
/// }"#).unwrap();
/// assert_eq!(options, GuardOptions::warrant("store", ":storeId", "owner", "/login"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardOptions {
    pub check: CheckDescriptor,
    pub redirect_to: String,
}

impl GuardOptions {
    pub fn new(check: impl Into<CheckDescriptor>, redirect_to: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            redirect_to: redirect_to.into(),
        }
    }

    pub fn permission(permission_id: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        Self::new(CheckDescriptor::permission(permission_id), redirect_to)
    }

    pub fn feature(feature_id: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        Self::new(CheckDescriptor::feature(feature_id), redirect_to)
    }

    /// A single relation check.
    pub fn warrant(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self::new(Check::new(object_type, object_id, relation), redirect_to)
    }

    /// Several relation checks combined with `op`.
    pub fn warrants(op: CheckOp, warrants: Vec<Check>, redirect_to: impl Into<String>) -> Self {
        Self::new(CheckMany::new(Some(op), warrants), redirect_to)
    }
}

/// Turn a guard's decision into output, navigating once on denial.
fn settle<V>(
    gate: &Gate,
    decision: Decision,
    redirect_to: &str,
    mode: RedirectMode,
    navigator: &Arc<dyn Navigator>,
    view: impl FnOnce() -> V,
) -> Rendered<V> {
    match decision {
        Decision::Pending => Rendered::Nothing,
        Decision::Granted => Rendered::View(view()),
        Decision::Denied => {
            if gate.take_redirect() {
                debug!("access denied, redirecting to {}", redirect_to);
                navigator.navigate(redirect_to, mode);
                gate.context().emit(&WarrantEvent::Redirected {
                    to: redirect_to.to_string(),
                    mode,
                });
            }
            Rendered::Redirected(redirect_to.to_string())
        }
    }
}
