//! Route parameters and placeholder substitution.
//!
//! Route guards let an object id refer to a matched path parameter. An object
//! id written as `:name` is a placeholder for the parameter `name`:
//!
//! ```rust
//! use warrant_gate::{substitute_params, Check, CheckDescriptor, RouteMatch};
//!
//! let descriptor = CheckDescriptor::from(Check::new("store", ":storeId", "viewer"));
//! let route = RouteMatch::new("/stores/:storeId").with_param("storeId", "store-42");
//!
//! let resolved = substitute_params(&descriptor, &route).unwrap();
//! assert_eq!(resolved, CheckDescriptor::from(Check::new("store", "store-42", "viewer")));
//! ```
//!
//! Only the `:name` form is a placeholder. An object id that merely equals a
//! parameter name (`storeId`) is checked literally and never substituted.

use std::collections::{BTreeMap, HashMap};

use crate::check::{Check, CheckDescriptor};
use crate::error::{Error, Result};

/// Looks up matched path parameters by name.
///
/// Implemented by the routing collaborator; the gate never sees a router's
/// own match type.
pub trait ParamResolver {
    fn param(&self, name: &str) -> Option<&str>;
}

impl ParamResolver for HashMap<String, String> {
    fn param(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl ParamResolver for BTreeMap<String, String> {
    fn param(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// The route a guard is rendering for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Pattern or concrete path that matched.
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl ParamResolver for RouteMatch {
    fn param(&self, name: &str) -> Option<&str> {
        self.params.param(name)
    }
}

/// The parameter name an object id refers to, if it is a placeholder.
pub fn placeholder(object_id: &str) -> Option<&str> {
    object_id.strip_prefix(':').filter(|name| !name.is_empty())
}

/// Replace every `:name` object id with the matching route parameter.
///
/// Returns a new descriptor; the input is left untouched so the caller's
/// options stay equal across renders. A placeholder with no (or an empty)
/// parameter fails with [`Error::MissingRouteParam`].
pub fn substitute_params<R>(descriptor: &CheckDescriptor, params: &R) -> Result<CheckDescriptor>
where
    R: ParamResolver + ?Sized,
{
    let mut resolved = descriptor.clone();
    match &mut resolved {
        CheckDescriptor::Relation(check) => resolve_check(check, params)?,
        CheckDescriptor::Batch(batch) => {
            for check in &mut batch.warrants {
                resolve_check(check, params)?;
            }
        }
        CheckDescriptor::Permission(_) | CheckDescriptor::Feature(_) => {}
    }
    Ok(resolved)
}

fn resolve_check<R>(check: &mut Check, params: &R) -> Result<()>
where
    R: ParamResolver + ?Sized,
{
    let Some(name) = placeholder(&check.object_id) else {
        return Ok(());
    };

    let value = params
        .param(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::MissingRouteParam(name.to_string()))?
        .to_string();
    check.object_id = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckMany, CheckOp};

    #[test]
    fn test_placeholder() {
        assert_eq!(placeholder(":storeId"), Some("storeId"));
        assert_eq!(placeholder("store-1"), None);
        assert_eq!(placeholder(":"), None);
        assert_eq!(placeholder(""), None);
    }

    #[test]
    fn test_substitute_leaves_input_untouched() {
        let descriptor = CheckDescriptor::relation("store", ":storeId", "owner");
        let route = RouteMatch::new("/stores/:storeId").with_param("storeId", "42");

        let resolved = substitute_params(&descriptor, &route).unwrap();
        assert_eq!(resolved, CheckDescriptor::relation("store", "42", "owner"));
        assert_eq!(
            descriptor,
            CheckDescriptor::relation("store", ":storeId", "owner")
        );
    }

    #[test]
    fn test_substitute_missing_param_fails() {
        let descriptor = CheckDescriptor::relation("store", ":storeId", "owner");
        let route = RouteMatch::new("/stores").with_param("orgId", "7");

        let err = substitute_params(&descriptor, &route).unwrap_err();
        assert!(matches!(err, Error::MissingRouteParam(ref name) if name == "storeId"));
    }

    #[test]
    fn test_substitute_empty_param_fails() {
        let descriptor = CheckDescriptor::relation("store", ":storeId", "owner");
        let route = RouteMatch::new("/stores/").with_param("storeId", "");
        assert!(substitute_params(&descriptor, &route).is_err());
    }

    #[test]
    fn test_substitute_batch_and_literals() {
        let descriptor = CheckDescriptor::Batch(CheckMany::new(
            Some(CheckOp::AllOf),
            vec![
                Check::new("org", ":orgId", "member"),
                Check::new("store", "flagship", "viewer"),
            ],
        ));
        let mut params = HashMap::new();
        params.insert("orgId".to_string(), "acme".to_string());

        let resolved = substitute_params(&descriptor, &params).unwrap();
        let CheckDescriptor::Batch(batch) = resolved else {
            panic!("expected batch");
        };
        assert_eq!(batch.warrants[0].object_id, "acme");
        assert_eq!(batch.warrants[1].object_id, "flagship");
    }

    #[test]
    fn test_bare_param_name_is_literal() {
        let descriptor = CheckDescriptor::relation("store", "storeId", "owner");
        let route = RouteMatch::new("/stores/:storeId").with_param("storeId", "42");
        assert_eq!(substitute_params(&descriptor, &route).unwrap(), descriptor);
    }

    #[test]
    fn test_permission_and_feature_pass_through() {
        let descriptor = CheckDescriptor::permission("billing:view");
        let resolved = substitute_params(&descriptor, &RouteMatch::default()).unwrap();
        assert_eq!(resolved, descriptor);
    }
}
