use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::gate::{mounted_gate, Decision, Gate};
use crate::provider::WarrantContext;
use crate::route::{substitute_params, ParamResolver};

use super::{settle, GuardOptions, Navigator, RedirectMode, Rendered};

/// A route that renders its view only for authorized users.
///
/// Placeholders (`:name`) in relation object ids are filled from the matched
/// route before checking. Denied users are sent to
/// [`GuardOptions::redirect_to`] once per denied dependency pair.
///
/// ```ignore
/// let route = ProtectedRoute::new(
///     &context,
///     GuardOptions::warrant("store", ":storeId", "owner", "/login"),
///     router.navigator(),
/// )?;
///
/// match route.render(&matched, |m| store_page(m)).await? {
///     Rendered::View(page) => show(page),
///     Rendered::Nothing | Rendered::Redirected(_) => {}
/// }
/// ```
pub struct ProtectedRoute {
    gate: Gate,
    options: GuardOptions,
    navigator: Arc<dyn Navigator>,
}

impl ProtectedRoute {
    /// Fails with a configuration error if `context` has no provider.
    pub fn new(
        context: &WarrantContext,
        options: GuardOptions,
        navigator: impl Navigator + 'static,
    ) -> Result<Self> {
        Ok(Self {
            gate: mounted_gate(context)?,
            options,
            navigator: Arc::new(navigator),
        })
    }

    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    pub fn decision(&self) -> Decision {
        self.gate.decision()
    }

    /// Render for the matched `route`.
    ///
    /// With no session token this renders nothing and never redirects, and
    /// the guard's decision returns to pending. A missing route parameter is
    /// reported as an error. A render superseded by a newer one renders
    /// nothing.
    pub async fn render<R, V>(&self, route: &R, view: impl FnOnce(&R) -> V) -> Result<Rendered<V>>
    where
        R: ParamResolver + ?Sized,
    {
        let context = self.gate.context();
        context.ensure_mounted()?;

        // Params are only resolved once there is a token to check with; the
        // gate still sees the empty token and drops back to pending.
        let descriptor = if context.is_ready() {
            substitute_params(&self.options.check, route)?
        } else {
            debug!("route guard waiting for a session token");
            self.options.check.clone()
        };
        let decision = self.gate.sync(&descriptor).await?;
        Ok(settle(
            &self.gate,
            decision,
            &self.options.redirect_to,
            RedirectMode::Push,
            &self.navigator,
            || view(route),
        ))
    }
}

impl std::fmt::Debug for ProtectedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectedRoute")
            .field("gate", &self.gate)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
