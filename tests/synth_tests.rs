//! Integration tests for synthesis and the on-disk cloud assembly

use pretty_assertions::assert_eq;
use serde_json::Value;
use stacksmith::prelude::*;
use stacksmith::synth::assembly::{MANIFEST_FILE, TREE_FILE};
use stacksmith::synth::cloudformation::logical_id;
use tempfile::tempdir;

fn app(params: DeploymentParameters, env: Environment) -> App {
    let mut app = App::new();
    app.add_stack(
        DEFAULT_STACK_ID,
        StackProps::new(params, StackSettings::default()).with_env(env),
    )
    .unwrap();
    app
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_assembly_files() {
    let dir = tempdir().unwrap();
    let assembly = app(DeploymentParameters::default(), Environment::default())
        .synth(&CloudFormationSynthesizer::new())
        .unwrap();

    let written = assembly.write(dir.path(), true).unwrap();
    assert_eq!(written.len(), 3);
    assert!(dir.path().join("IaCKafkaEC2.template.json").exists());
    assert!(dir.path().join(MANIFEST_FILE).exists());
    assert!(dir.path().join(TREE_FILE).exists());
}

#[test]
fn test_manifest_environment_agnostic() {
    let dir = tempdir().unwrap();
    app(DeploymentParameters::default(), Environment::default())
        .synth(&CloudFormationSynthesizer::new())
        .unwrap()
        .write(dir.path(), true)
        .unwrap();

    let manifest = read_json(&dir.path().join(MANIFEST_FILE));
    assert_eq!(
        manifest["artifacts"]["IaCKafkaEC2"]["environment"],
        "aws://unknown-account/unknown-region"
    );
}

#[test]
fn test_manifest_bound_environment() {
    let env = Environment::new(Some("123456789012".into()), Some("us-east-1".into()));
    let assembly = app(DeploymentParameters::default(), env)
        .synth(&CloudFormationSynthesizer::new())
        .unwrap();

    assert_eq!(
        assembly.manifest()["artifacts"]["IaCKafkaEC2"]["environment"],
        "aws://123456789012/us-east-1"
    );
}

#[test]
fn test_template_resources() {
    let assembly = app(DeploymentParameters::default(), Environment::default())
        .synth(&CloudFormationSynthesizer::new())
        .unwrap();
    let template = &assembly.artifact(DEFAULT_STACK_ID).unwrap().template;

    let vpc = &template["Resources"][logical_id(DEFAULT_STACK_ID, &["MyVpc", "Resource"])];
    assert_eq!(vpc["Type"], "AWS::EC2::VPC");
    assert_eq!(vpc["Properties"]["CidrBlock"], "10.0.0.0/16");

    let subnet = &template["Resources"]
        [logical_id(DEFAULT_STACK_ID, &["MyVpc", "PublicSubnet2", "Subnet"])];
    assert_eq!(subnet["Properties"]["CidrBlock"], "10.0.1.0/24");

    let instance =
        &template["Resources"][logical_id(DEFAULT_STACK_ID, &["MyInstance", "Resource"])];
    assert_eq!(instance["Type"], "AWS::EC2::Instance");
    assert_eq!(instance["Properties"]["InstanceType"], "t2.large");
}

#[test]
fn test_parameters_stay_out_of_template() {
    let params = DeploymentParameters::new("demo", "us-east-1", "123456789012");
    let assembly = app(params, Environment::default())
        .synth(&CloudFormationSynthesizer::new())
        .unwrap();
    let body = serde_json::to_string(&assembly.artifacts()[0].template).unwrap();

    assert!(!body.contains("demo"));
    assert!(!body.contains("123456789012"));
}

#[test]
fn test_synthesis_is_byte_identical() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();

    for dir in [&first, &second] {
        app(DeploymentParameters::default(), Environment::default())
            .synth(&CloudFormationSynthesizer::new())
            .unwrap()
            .write(dir.path(), true)
            .unwrap();
    }

    for file in ["IaCKafkaEC2.template.json", MANIFEST_FILE, TREE_FILE] {
        let a = std::fs::read(first.path().join(file)).unwrap();
        let b = std::fs::read(second.path().join(file)).unwrap();
        assert!(a == b, "{file} differs between runs");
    }
}

#[test]
fn test_tree_maps_logical_ids_to_paths() {
    let assembly = app(DeploymentParameters::default(), Environment::default())
        .synth(&CloudFormationSynthesizer::new())
        .unwrap();
    let tree = assembly.tree();
    let sg_id = logical_id(DEFAULT_STACK_ID, &["MySecurityGroup", "Resource"]);

    assert_eq!(
        tree["stacks"]["IaCKafkaEC2"][sg_id.as_str()],
        "IaCKafkaEC2/MySecurityGroup/Resource"
    );
}

#[test]
fn test_compact_output() {
    let dir = tempdir().unwrap();
    app(DeploymentParameters::default(), Environment::default())
        .synth(&CloudFormationSynthesizer::new())
        .unwrap()
        .write(dir.path(), false)
        .unwrap();

    let body = std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
    assert_eq!(body.lines().count(), 1);
}
