//! Stack definition.
//!
//! A [`Stack`] is a named resource graph bound to an optional target
//! environment. Its graph is produced by [`define`], a pure function of the
//! deployment parameters and the stack settings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::DeploymentParameters;
use crate::resource::{
    BootScript, ComputeInstanceDescriptor, IngressRule, InstanceType, Ipv4Cidr, MachineImage,
    NetworkDescriptor, ResourceGraph, SecurityGroupDescriptor,
};

/// Identifier of the stack registered by the binary.
pub const DEFAULT_STACK_ID: &str = "IaCKafkaEC2";

/// Logical id of the network.
pub const NETWORK_ID: &str = "MyVpc";
/// Logical id of the security group.
pub const SECURITY_GROUP_ID: &str = "MySecurityGroup";
/// Logical id of the boot script.
pub const BOOT_SCRIPT_ID: &str = "MyInstanceUserData";
/// Logical id of the instance.
pub const INSTANCE_ID: &str = "MyInstance";

const SECURITY_GROUP_DESCRIPTION: &str = "Allow SSH access to ec2 instances";
const SSH_RULE_DESCRIPTION: &str = "Allow SSH Access";

/// Boot steps, rendered against the `[broker]` settings.
const BROKER_BOOT_STEPS: &[(&str, &str)] = &[
    ("update", "sudo yum update -y"),
    ("install-java", "sudo dnf install {{ java_package }} -y"),
    (
        "download-archive",
        "wget {{ download_mirror }}/{{ kafka_version }}/kafka_{{ scala_version }}-{{ kafka_version }}.tgz",
    ),
    (
        "extract-archive",
        "tar -xzf kafka_{{ scala_version }}-{{ kafka_version }}.tgz",
    ),
    (
        "change-directory",
        "cd kafka_{{ scala_version }}-{{ kafka_version }}",
    ),
    (
        "start-zookeeper",
        "bin/zookeeper-server-start.sh config/zookeeper.properties",
    ),
];

const START_BROKER_STEP: (&str, &str) = (
    "start-broker",
    "bin/kafka-server-start.sh config/server.properties",
);

// ============================================================================
// Settings
// ============================================================================

/// Network settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Address space of the network
    pub cidr: String,
    /// Availability zones to span
    pub max_azs: u8,
    /// Prefix length of each public subnet
    pub subnet_mask: u8,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            cidr: crate::resource::network::DEFAULT_NETWORK_CIDR.to_string(),
            max_azs: crate::resource::network::DEFAULT_MAX_AZS,
            subnet_mask: crate::resource::network::DEFAULT_SUBNET_PREFIX,
        }
    }
}

/// Security group settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Source block allowed to reach SSH
    pub ssh_ingress_cidr: String,
    /// SSH port
    pub ssh_port: u16,
    /// Allow every outbound connection
    pub allow_all_outbound: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            ssh_ingress_cidr: "0.0.0.0/0".to_string(),
            ssh_port: 22,
            allow_all_outbound: true,
        }
    }
}

/// Instance settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceSettings {
    /// Instance family, e.g. `t2`
    pub instance_class: String,
    /// Instance size, e.g. `large`
    pub instance_size: String,
    /// `amazon-linux-2`, `amazon-linux-2023` or an `ami-` id
    pub machine_image: String,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            instance_class: "t2".to_string(),
            instance_size: "large".to_string(),
            machine_image: "amazon-linux-2".to_string(),
        }
    }
}

/// Broker bootstrap settings, also the boot template context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// Kafka release
    pub kafka_version: String,
    /// Scala build of the release
    pub scala_version: String,
    /// Java runtime package
    pub java_package: String,
    /// Base URL of the release archive
    pub download_mirror: String,
    /// Append a broker start after ZooKeeper
    pub start_broker: bool,
    /// Stop the boot script at the first failing command
    pub halt_on_error: bool,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            kafka_version: "3.7.1".to_string(),
            scala_version: "2.13".to_string(),
            java_package: "java-21-amazon-corretto".to_string(),
            download_mirror: "https://downloads.apache.org/kafka".to_string(),
            start_broker: false,
            halt_on_error: false,
        }
    }
}

/// Everything the stack definition reads besides the deployment parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    /// Network settings
    pub network: NetworkSettings,
    /// Security group settings
    pub security: SecuritySettings,
    /// Instance settings
    pub instance: InstanceSettings,
    /// Broker bootstrap settings
    pub broker: BrokerSettings,
}

// ============================================================================
// Stack
// ============================================================================

/// Target account and region of a stack.
///
/// Both unset means the stack is environment-agnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Environment {
    /// Account id
    pub account: Option<String>,
    /// Region
    pub region: Option<String>,
}

impl Environment {
    /// Bind to an account and region.
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self {
            account: account.filter(|a| !a.is_empty()),
            region: region.filter(|r| !r.is_empty()),
        }
    }

    /// True when neither account nor region is bound.
    pub fn is_agnostic(&self) -> bool {
        self.account.is_none() && self.region.is_none()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

/// Inputs of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackProps {
    /// Deployment parameters
    pub params: DeploymentParameters,
    /// Stack settings
    pub settings: StackSettings,
    /// Target environment
    pub env: Environment,
}

impl StackProps {
    /// Environment-agnostic props.
    pub fn new(params: DeploymentParameters, settings: StackSettings) -> Self {
        Self {
            params,
            settings,
            env: Environment::default(),
        }
    }

    /// Bind the props to a target environment.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }
}

/// A named, fully built resource graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    id: String,
    props: StackProps,
    graph: ResourceGraph,
}

impl Stack {
    /// Build a stack. Fails if the definition fails; no partial stack exists.
    pub fn new(id: impl Into<String>, props: StackProps) -> Result<Self> {
        let id = id.into();
        let graph = define(&props.params, &props.settings).map_err(|e| {
            tracing::debug!("Stack '{}' failed to build: {}", id, e);
            e
        })?;
        tracing::info!("Built stack '{}' with {} resources", id, graph.len());
        Ok(Self { id, props, graph })
    }

    /// Stack id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Target environment
    pub fn env(&self) -> &Environment {
        &self.props.env
    }

    /// Deployment parameters the stack was built with
    pub fn params(&self) -> &DeploymentParameters {
        &self.props.params
    }

    /// Settings the stack was built with
    pub fn settings(&self) -> &StackSettings {
        &self.props.settings
    }

    /// Resource graph
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }
}

/// Declare the network, security group, boot script and instance.
///
/// Deterministic: equal inputs give structurally equal graphs. The
/// deployment parameters are accepted but do not flow into any descriptor.
pub fn define(params: &DeploymentParameters, settings: &StackSettings) -> Result<ResourceGraph> {
    tracing::debug!(
        project = %params.project_name,
        region = %params.region,
        account = %params.account_id,
        "Defining resources"
    );

    let mut graph = ResourceGraph::new();

    let cidr: Ipv4Cidr = settings.network.cidr.parse()?;
    let vpc = graph.add(
        NETWORK_ID,
        NetworkDescriptor::new(cidr)
            .with_max_azs(settings.network.max_azs)
            .with_subnet_prefix(settings.network.subnet_mask),
    )?;

    let ssh_peer: Ipv4Cidr = settings
        .security
        .ssh_ingress_cidr
        .parse()
        .map_err(|e: Error| Error::invalid_config("security.ssh_ingress_cidr", e.to_string()))?;
    let mut security_group = SecurityGroupDescriptor::new(vpc.clone(), SECURITY_GROUP_DESCRIPTION)
        .with_allow_all_outbound(settings.security.allow_all_outbound);
    security_group.add_ingress_rule(IngressRule::tcp(
        ssh_peer,
        settings.security.ssh_port,
        SSH_RULE_DESCRIPTION,
    ));
    let security_group = graph.add(SECURITY_GROUP_ID, security_group)?;

    let mut boot_script = BootScript::for_linux().with_halt_on_error(settings.broker.halt_on_error);
    boot_script.add_templates(BROKER_BOOT_STEPS, &settings.broker)?;
    if settings.broker.start_broker {
        boot_script.add_templates(&[START_BROKER_STEP], &settings.broker)?;
    }
    let boot_script = graph.add(BOOT_SCRIPT_ID, boot_script)?;

    let instance_type = InstanceType::of(
        settings.instance.instance_class.parse()?,
        settings.instance.instance_size.parse()?,
    );
    let machine_image: MachineImage = settings.instance.machine_image.parse()?;
    graph.add(
        INSTANCE_ID,
        ComputeInstanceDescriptor {
            instance_type,
            machine_image,
            network: vpc,
            security_group,
            boot_script,
        },
    )?;

    graph.validate()?;
    Ok(graph)
}
