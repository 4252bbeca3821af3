//! Tests for reading deployment parameters from the process environment
//!
//! These tests mutate process-wide environment variables and therefore run
//! serially.

use pretty_assertions::assert_eq;
use serial_test::serial;
use stacksmith::params::{DeploymentParameters, ACCOUNT_ID_VAR, PROJECT_NAME_VAR, REGION_VAR};

fn clear_env() {
    for var in [PROJECT_NAME_VAR, REGION_VAR, ACCOUNT_ID_VAR] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_all_unset_defaults_to_empty() {
    clear_env();
    let params = DeploymentParameters::from_env();
    assert_eq!(params, DeploymentParameters::new("", "", ""));
}

#[test]
#[serial]
fn test_all_set() {
    clear_env();
    std::env::set_var(PROJECT_NAME_VAR, "demo");
    std::env::set_var(REGION_VAR, "us-east-1");
    std::env::set_var(ACCOUNT_ID_VAR, "123456789012");

    let params = DeploymentParameters::from_env();
    clear_env();

    assert_eq!(
        params,
        DeploymentParameters::new("demo", "us-east-1", "123456789012")
    );
}

#[test]
#[serial]
fn test_partially_set() {
    clear_env();
    std::env::set_var(ACCOUNT_ID_VAR, "123456789012");

    let params = DeploymentParameters::from_env();
    clear_env();

    assert_eq!(params.project_name, "");
    assert_eq!(params.region, "");
    assert_eq!(params.account_id, "123456789012");
}
