use crate::check::{Check, CheckDescriptor, CheckMany, CheckOp};
use crate::error::Result;
use crate::gate::{mounted_gate, Decision, Gate};
use crate::provider::WarrantContext;

use super::Rendered;

/// Renders its children only when the check is granted.
///
/// While the decision is pending, and when it is denied, nothing is
/// rendered. Props changes go through [`ProtectedComponent::update`]; an equal
/// descriptor does not trigger a new call.
///
/// ```ignore
/// let component = ProtectedComponent::permission(&context, "billing:view")?;
/// let rendered = component.render(|| billing_panel()).await?;
/// ```
#[derive(Debug)]
pub struct ProtectedComponent {
    gate: Gate,
    descriptor: CheckDescriptor,
}

impl ProtectedComponent {
    /// Fails with a configuration error if `context` has no provider.
    pub fn new(context: &WarrantContext, descriptor: impl Into<CheckDescriptor>) -> Result<Self> {
        Ok(Self {
            gate: mounted_gate(context)?,
            descriptor: descriptor.into(),
        })
    }

    pub fn permission(context: &WarrantContext, permission_id: impl Into<String>) -> Result<Self> {
        Self::new(context, CheckDescriptor::permission(permission_id))
    }

    pub fn feature(context: &WarrantContext, feature_id: impl Into<String>) -> Result<Self> {
        Self::new(context, CheckDescriptor::feature(feature_id))
    }

    pub fn warrants(context: &WarrantContext, op: CheckOp, warrants: Vec<Check>) -> Result<Self> {
        Self::new(context, CheckMany::new(Some(op), warrants))
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    /// Replace the descriptor with freshly built props.
    pub fn update(&mut self, descriptor: impl Into<CheckDescriptor>) {
        self.descriptor = descriptor.into();
    }

    pub fn decision(&self) -> Decision {
        self.gate.decision()
    }

    /// Evaluate if needed, then build `children` only when granted.
    pub async fn render<V>(&self, children: impl FnOnce() -> V) -> Result<Rendered<V>> {
        match self.gate.sync(&self.descriptor).await? {
            Decision::Granted => Ok(Rendered::View(children())),
            Decision::Pending | Decision::Denied => Ok(Rendered::Nothing),
        }
    }
}
