//! Check descriptors.
//!
//! A descriptor says *what* to ask the authorization service. Descriptors are
//! plain values built fresh from component props on every render; gates
//! compare them by value, so two separately built descriptors with the same
//! fields are the same dependency.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a batch of relation checks is combined by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckOp {
    /// Every warrant must hold.
    #[serde(rename = "allOf")]
    AllOf,

    /// At least one warrant must hold.
    #[serde(rename = "anyOf")]
    AnyOf,
}

impl fmt::Display for CheckOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOp::AllOf => write!(f, "allOf"),
            CheckOp::AnyOf => write!(f, "anyOf"),
        }
    }
}

/// A single relation check: does the session's subject have `relation` on
/// `object_type:object_id`?
///
/// # Example
///
/// ```rust
/// use warrant_gate::Check;
///
/// let check = Check::new("store", "store-1", "owner").consistent_read();
/// assert!(check.validate().is_ok());
///
/// // Route guards accept `:name` placeholders, filled from the matched route
/// let check = Check::new("store", ":storeId", "viewer");
/// assert_eq!(check.object_id, ":storeId");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub object_type: String,
    pub object_id: String,
    pub relation: String,

    /// Extra policy context forwarded to the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, serde_json::Value>>,

    /// Force a strongly-consistent read.
    #[serde(default)]
    pub consistent_read: bool,

    #[serde(default)]
    pub debug: bool,
}

impl Check {
    pub fn new(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
            relation: relation.into(),
            context: None,
            consistent_read: false,
            debug: false,
        }
    }

    /// Add a context entry forwarded to the policy engine.
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn consistent_read(mut self) -> Self {
        self.consistent_read = true;
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Reject checks missing an object type, object id or relation.
    pub fn validate(&self) -> Result<()> {
        require("objectType", &self.object_type)?;
        require("objectId", &self.object_id)?;
        require("relation", &self.relation)
    }
}

/// Several relation checks combined with an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckMany {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<CheckOp>,
    pub warrants: Vec<Check>,
    #[serde(default)]
    pub consistent_read: bool,
    #[serde(default)]
    pub debug: bool,
}

impl CheckMany {
    pub fn new(op: Option<CheckOp>, warrants: Vec<Check>) -> Self {
        Self {
            op,
            warrants,
            consistent_read: false,
            debug: false,
        }
    }

    pub fn all_of(warrants: Vec<Check>) -> Self {
        Self::new(Some(CheckOp::AllOf), warrants)
    }

    pub fn any_of(warrants: Vec<Check>) -> Self {
        Self::new(Some(CheckOp::AnyOf), warrants)
    }

    pub fn consistent_read(mut self) -> Self {
        self.consistent_read = true;
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// A batch needs at least one warrant, an operator once it has more than
    /// one, and every warrant must itself be valid.
    pub fn validate(&self) -> Result<()> {
        if self.warrants.is_empty() {
            return Err(Error::InvalidCheck(
                "batch check requires at least one warrant".to_string(),
            ));
        }
        if self.op.is_none() && self.warrants.len() > 1 {
            return Err(Error::InvalidCheck(format!(
                "batch check with {} warrants requires an op (allOf or anyOf)",
                self.warrants.len()
            )));
        }
        self.warrants.iter().try_for_each(Check::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheck {
    pub permission_id: String,
    #[serde(default)]
    pub consistent_read: bool,
    #[serde(default)]
    pub debug: bool,
}

impl PermissionCheck {
    pub fn new(permission_id: impl Into<String>) -> Self {
        Self {
            permission_id: permission_id.into(),
            consistent_read: false,
            debug: false,
        }
    }

    pub fn consistent_read(mut self) -> Self {
        self.consistent_read = true;
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("permissionId", &self.permission_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCheck {
    pub feature_id: String,
    #[serde(default)]
    pub consistent_read: bool,
    #[serde(default)]
    pub debug: bool,
}

impl FeatureCheck {
    pub fn new(feature_id: impl Into<String>) -> Self {
        Self {
            feature_id: feature_id.into(),
            consistent_read: false,
            debug: false,
        }
    }

    pub fn consistent_read(mut self) -> Self {
        self.consistent_read = true;
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require("featureId", &self.feature_id)
    }
}

/// Any check a consumer can gate on.
///
/// Serialized with a `kind` tag so guard options can be loaded from config:
///
/// ```rust
/// use warrant_gate::CheckDescriptor;
///
/// let descriptor: CheckDescriptor =
///     serde_json::from_str(r#"{"kind":"permission","permissionId":"billing:view"}"#).unwrap();
/// assert_eq!(descriptor.kind(), "permission");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CheckDescriptor {
    Relation(Check),
    Permission(PermissionCheck),
    Feature(FeatureCheck),
    Batch(CheckMany),
}

impl CheckDescriptor {
    pub fn permission(permission_id: impl Into<String>) -> Self {
        Self::Permission(PermissionCheck::new(permission_id))
    }

    pub fn feature(feature_id: impl Into<String>) -> Self {
        Self::Feature(FeatureCheck::new(feature_id))
    }

    pub fn relation(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self::Relation(Check::new(object_type, object_id, relation))
    }

    pub fn batch(op: CheckOp, warrants: Vec<Check>) -> Self {
        Self::Batch(CheckMany::new(Some(op), warrants))
    }

    /// Short name of the shape, used in events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Relation(_) => "relation",
            Self::Permission(_) => "permission",
            Self::Feature(_) => "feature",
            Self::Batch(_) => "batch",
        }
    }

    /// Fail fast on a malformed descriptor, before any network call.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Relation(check) => check.validate(),
            Self::Permission(check) => check.validate(),
            Self::Feature(check) => check.validate(),
            Self::Batch(check) => check.validate(),
        }
    }
}

impl From<Check> for CheckDescriptor {
    fn from(check: Check) -> Self {
        Self::Relation(check)
    }
}

impl From<CheckMany> for CheckDescriptor {
    fn from(check: CheckMany) -> Self {
        Self::Batch(check)
    }
}

impl From<PermissionCheck> for CheckDescriptor {
    fn from(check: PermissionCheck) -> Self {
        Self::Permission(check)
    }
}

impl From<FeatureCheck> for CheckDescriptor {
    fn from(check: FeatureCheck) -> Self {
        Self::Feature(check)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidCheck(format!("invalid or no {} provided", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relation_check_requires_every_field() {
        assert!(Check::new("store", "1", "owner").validate().is_ok());

        let err = Check::new("store", "", "owner").validate().unwrap_err();
        assert!(err.is_invalid_check());
        assert!(err.to_string().contains("objectId"));

        assert!(Check::new("", "1", "owner").validate().is_err());
        assert!(Check::new("store", "1", "  ").validate().is_err());
    }

    #[test]
    fn test_batch_validation() {
        let empty = CheckMany::any_of(vec![]);
        assert!(empty.validate().unwrap_err().is_invalid_check());

        // A lone warrant does not need an operator
        let single = CheckMany::new(None, vec![Check::new("store", "1", "owner")]);
        assert!(single.validate().is_ok());

        let ambiguous = CheckMany::new(
            None,
            vec![
                Check::new("store", "1", "owner"),
                Check::new("store", "2", "owner"),
            ],
        );
        assert!(ambiguous
            .validate()
            .unwrap_err()
            .to_string()
            .contains("requires an op"));

        let bad_member = CheckMany::all_of(vec![
            Check::new("store", "1", "owner"),
            Check::new("store", "", "owner"),
        ]);
        assert!(bad_member.validate().is_err());
    }

    #[test]
    fn test_permission_and_feature_validation() {
        assert!(PermissionCheck::new("billing:view").validate().is_ok());
        assert!(PermissionCheck::new("").validate().is_err());
        assert!(FeatureCheck::new("sso").validate().is_ok());
        assert!(FeatureCheck::new("").validate().is_err());
    }

    #[test]
    fn test_descriptor_equality_is_by_value() {
        let a = CheckDescriptor::from(Check::new("store", "1", "owner").consistent_read());
        let b = CheckDescriptor::from(Check::new("store", "1", "owner").consistent_read());
        assert_eq!(a, b);

        let c = CheckDescriptor::from(Check::new("store", "1", "owner"));
        assert_ne!(a, c);
    }

    #[test]
    fn test_descriptor_serde_shape() {
        let descriptor = CheckDescriptor::batch(
            CheckOp::AnyOf,
            vec![Check::new("store", "1", "owner").with_context("ip", json!("10.0.0.1"))],
        );
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["kind"], "batch");
        assert_eq!(value["op"], "anyOf");
        assert_eq!(value["warrants"][0]["objectType"], "store");
        assert_eq!(value["warrants"][0]["context"]["ip"], "10.0.0.1");

        let parsed: CheckDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn test_descriptor_defaults_flags_when_absent() {
        let parsed: CheckDescriptor =
            serde_json::from_value(json!({"kind": "feature", "featureId": "sso"})).unwrap();
        assert_eq!(parsed, CheckDescriptor::feature("sso"));
    }

    #[test]
    fn test_check_op_display() {
        assert_eq!(CheckOp::AllOf.to_string(), "allOf");
        assert_eq!(CheckOp::AnyOf.to_string(), "anyOf");
    }
}
