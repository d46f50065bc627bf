use std::sync::Arc;

use crate::error::Result;
use crate::gate::{mounted_gate, Decision, Gate};
use crate::provider::WarrantContext;

use super::{settle, GuardOptions, Navigator, RedirectMode, Rendered};

/// Wrap a view factory so it only renders for authorized users.
///
/// The wrapped factory receives the props passed to [`WithCheck::render`].
/// Denied users are redirected declaratively; call
/// [`WithCheck::replace_history`] to replace the current history entry
/// instead.
///
/// ```ignore
/// let settings = with_check(
///     &context,
///     |props: SettingsProps| settings_page(props),
///     GuardOptions::permission("settings:edit", "/"),
///     navigator,
/// )?;
///
/// let rendered = settings.render(props).await?;
/// ```
pub fn with_check<F>(
    context: &WarrantContext,
    factory: F,
    options: GuardOptions,
    navigator: impl Navigator + 'static,
) -> Result<WithCheck<F>> {
    Ok(WithCheck {
        gate: mounted_gate(context)?,
        factory,
        options,
        navigator: Arc::new(navigator),
        mode: RedirectMode::Push,
    })
}

/// A view factory behind an authorization check. Built by [`with_check`].
pub struct WithCheck<F> {
    gate: Gate,
    factory: F,
    options: GuardOptions,
    navigator: Arc<dyn Navigator>,
    mode: RedirectMode,
}

impl<F> WithCheck<F> {
    /// Redirect by replacing the current history entry.
    pub fn replace_history(mut self) -> Self {
        self.mode = RedirectMode::Replace;
        self
    }

    pub fn redirect_mode(&self) -> RedirectMode {
        self.mode
    }

    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    pub fn decision(&self) -> Decision {
        self.gate.decision()
    }

    /// Render the wrapped view with `props` if authorized.
    ///
    /// With no session token this renders nothing and the decision returns
    /// to pending.
    pub async fn render<P, V>(&self, props: P) -> Result<Rendered<V>>
    where
        F: Fn(P) -> V,
    {
        let decision = self.gate.sync(&self.options.check).await?;
        Ok(settle(
            &self.gate,
            decision,
            &self.options.redirect_to,
            self.mode,
            &self.navigator,
            || (self.factory)(props),
        ))
    }
}

impl<F> std::fmt::Debug for WithCheck<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithCheck")
            .field("gate", &self.gate)
            .field("options", &self.options)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
