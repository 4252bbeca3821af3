//! Deployment parameters.
//!
//! The three inputs of a stack are read from the process environment exactly
//! once, at the boundary, and then passed by value. Nothing below the entry
//! point looks at the environment again.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PROJECT_NAME` | `project_name` |
//! | `AWS_REGION` | `region` |
//! | `AWS_ACCOUNT_ID` | `account_id` |
//!
//! An absent variable becomes an empty string without a warning.

use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable holding the project name.
pub const PROJECT_NAME_VAR: &str = "PROJECT_NAME";
/// Environment variable holding the target region.
pub const REGION_VAR: &str = "AWS_REGION";
/// Environment variable holding the target account id.
pub const ACCOUNT_ID_VAR: &str = "AWS_ACCOUNT_ID";

/// Inputs to a stack definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentParameters {
    /// Project name
    pub project_name: String,
    /// Target region
    pub region: String,
    /// Target account id
    pub account_id: String,
}

impl DeploymentParameters {
    /// Create parameters from explicit values.
    pub fn new(
        project_name: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            region: region.into(),
            account_id: account_id.into(),
        }
    }

    /// Read parameters from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read parameters through an arbitrary lookup; `None` maps to `""`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name).unwrap_or_else(|| {
                tracing::debug!("{} is not set, using empty string", name);
                String::new()
            })
        };

        Self {
            project_name: read(PROJECT_NAME_VAR),
            region: read(REGION_VAR),
            account_id: read(ACCOUNT_ID_VAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_lookup_all_missing() {
        let params = DeploymentParameters::from_lookup(|_| None);
        assert_eq!(params, DeploymentParameters::new("", "", ""));
    }

    #[test]
    fn test_lookup_partial() {
        let vars: HashMap<&str, &str> = [(REGION_VAR, "eu-west-1")].into_iter().collect();
        let params = DeploymentParameters::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(params.project_name, "");
        assert_eq!(params.region, "eu-west-1");
        assert_eq!(params.account_id, "");
    }

    #[test]
    fn test_lookup_empty_value_kept() {
        let params = DeploymentParameters::from_lookup(|k| {
            (k == PROJECT_NAME_VAR).then(String::new)
        });
        assert_eq!(params.project_name, "");
    }
}
