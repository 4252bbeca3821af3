//! CloudFormation adapter.
//!
//! Emits one JSON template per stack. Networks expand into a VPC with one
//! public subnet per availability zone, an internet gateway and a shared
//! public route table; security groups and instances map one to one. Boot
//! scripts have no resource of their own and end up in the instance's
//! `UserData`.
//!
//! Logical ids are derived from construct paths, so the same stack always
//! yields the same template bytes.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::{StackArtifact, Synthesizer};
use crate::error::{Error, Result};
use crate::resource::{
    ComputeInstanceDescriptor, IngressRule, LogicalId, NetworkDescriptor, Protocol,
    SecurityGroupDescriptor,
};
use crate::stack::Stack;

const ARTIFACT_TYPE: &str = "aws:cloudformation:stack";
const IMAGE_PARAMETER_TYPE: &str = "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>";

/// Engine logical id for a construct path.
///
/// The readable part is the path below the stack with non-alphanumerics and
/// `Resource` segments dropped; the suffix is the first 8 uppercase hex
/// digits of the SHA-256 of the full path.
pub fn logical_id(stack_id: &str, components: &[&str]) -> String {
    let path = construct_path(stack_id, components);
    let readable: String = components
        .iter()
        .filter(|c| **c != "Resource")
        .flat_map(|c| c.chars().filter(char::is_ascii_alphanumeric))
        .collect();
    format!("{readable}{}", path_hash(&path))
}

fn construct_path(stack_id: &str, components: &[&str]) -> String {
    std::iter::once(stack_id)
        .chain(components.iter().copied())
        .collect::<Vec<_>>()
        .join("/")
}

fn path_hash(path: &str) -> String {
    Sha256::digest(path.as_bytes())
        .iter()
        .take(4)
        .map(|b| format!("{b:02X}"))
        .collect()
}

fn name_tag(value: String) -> Value {
    json!([{ "Key": "Name", "Value": value }])
}

fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

fn availability_zone(index: usize) -> Value {
    json!({ "Fn::Select": [index, { "Fn::GetAZs": "" }] })
}

/// Synthesizes stacks into CloudFormation templates.
#[derive(Debug, Clone, Default)]
pub struct CloudFormationSynthesizer {
    description: Option<String>,
}

impl CloudFormationSynthesizer {
    /// Create a synthesizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template `Description`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Synthesizer for CloudFormationSynthesizer {
    fn name(&self) -> &'static str {
        "cloudformation"
    }

    fn synthesize(&self, stack: &Stack) -> Result<StackArtifact> {
        let graph = stack.graph();
        graph.validate()?;

        let mut template = TemplateBuilder::new(stack.id());
        let mut networks = HashMap::new();

        for (id, network) in graph.networks() {
            let emitted = template.network(id, network)?;
            networks.insert(id.clone(), emitted);
        }

        let mut security_groups = HashMap::new();
        for (id, sg) in graph.security_groups() {
            let vpc = networks
                .get(&sg.network.id)
                .ok_or_else(|| template.missing(id, &sg.network.id))?;
            let group = template.security_group(id, sg, &vpc.vpc);
            security_groups.insert(id.clone(), group);
        }

        for (id, instance) in graph.instances() {
            let network = networks
                .get(&instance.network.id)
                .ok_or_else(|| template.missing(id, &instance.network.id))?;
            let group = security_groups
                .get(&instance.security_group.id)
                .ok_or_else(|| template.missing(id, &instance.security_group.id))?;
            let user_data = graph
                .get(&instance.boot_script.id)
                .and_then(|r| r.as_boot_script())
                .ok_or_else(|| template.missing(id, &instance.boot_script.id))?
                .render();
            template.instance(id, instance, network, group, user_data);
        }

        tracing::debug!(
            "Synthesized '{}' into {} template resources",
            stack.id(),
            template.resources.len()
        );

        let construct_paths = template.paths.clone();
        Ok(StackArtifact {
            stack_id: stack.id().to_string(),
            artifact_type: ARTIFACT_TYPE.to_string(),
            environment: stack.env().clone(),
            template: template.finish(self.description.as_deref()),
            construct_paths,
        })
    }
}

/// Logical ids emitted for one network.
#[derive(Debug, Clone)]
struct EmittedNetwork {
    vpc: String,
    first_subnet: String,
    default_route: String,
}

struct TemplateBuilder<'a> {
    stack_id: &'a str,
    parameters: Map<String, Value>,
    resources: Map<String, Value>,
    paths: IndexMap<String, String>,
}

impl<'a> TemplateBuilder<'a> {
    fn new(stack_id: &'a str) -> Self {
        Self {
            stack_id,
            parameters: Map::new(),
            resources: Map::new(),
            paths: IndexMap::new(),
        }
    }

    fn missing(&self, from: &LogicalId, to: &LogicalId) -> Error {
        Error::synthesis(
            self.stack_id,
            format!("'{from}' references '{to}', which produced no template resource"),
        )
    }

    fn add(
        &mut self,
        components: &[&str],
        resource_type: &str,
        properties: Value,
        depends_on: &[&str],
    ) -> String {
        let id = logical_id(self.stack_id, components);
        let mut resource = Map::new();
        resource.insert("Type".to_string(), json!(resource_type));
        resource.insert("Properties".to_string(), properties);
        if !depends_on.is_empty() {
            resource.insert("DependsOn".to_string(), json!(depends_on));
        }
        self.resources.insert(id.clone(), Value::Object(resource));
        self.paths
            .insert(id.clone(), construct_path(self.stack_id, components));
        id
    }

    fn tag(&self, components: &[&str]) -> Value {
        name_tag(construct_path(self.stack_id, components))
    }

    fn network(&mut self, id: &LogicalId, network: &NetworkDescriptor) -> Result<EmittedNetwork> {
        let id = id.as_str();
        let subnets = network
            .subnet_cidrs()
            .map_err(|e| Error::synthesis(self.stack_id, e.to_string()))?;

        let vpc = self.add(
            &[id, "Resource"],
            "AWS::EC2::VPC",
            json!({
                "CidrBlock": network.cidr.to_string(),
                "EnableDnsHostnames": network.enable_dns,
                "EnableDnsSupport": network.enable_dns,
                "InstanceTenancy": "default",
                "Tags": self.tag(&[id]),
            }),
            &[],
        );

        let igw = self.add(
            &[id, "IGW"],
            "AWS::EC2::InternetGateway",
            json!({ "Tags": self.tag(&[id]) }),
            &[],
        );
        let attachment = self.add(
            &[id, "VPCGW"],
            "AWS::EC2::VPCGatewayAttachment",
            json!({
                "InternetGatewayId": reference(&igw),
                "VpcId": reference(&vpc),
            }),
            &[],
        );

        let route_table = self.add(
            &[id, "PublicRouteTable", "RouteTable"],
            "AWS::EC2::RouteTable",
            json!({
                "Tags": self.tag(&[id, "PublicRouteTable"]),
                "VpcId": reference(&vpc),
            }),
            &[],
        );
        let default_route = self.add(
            &[id, "PublicRouteTable", "DefaultRoute"],
            "AWS::EC2::Route",
            json!({
                "DestinationCidrBlock": "0.0.0.0/0",
                "GatewayId": reference(&igw),
                "RouteTableId": reference(&route_table),
            }),
            &[attachment.as_str()],
        );

        let mut first_subnet = None;
        for (index, cidr) in subnets.iter().enumerate() {
            let name = format!("PublicSubnet{}", index + 1);
            let subnet = self.add(
                &[id, name.as_str(), "Subnet"],
                "AWS::EC2::Subnet",
                json!({
                    "AvailabilityZone": availability_zone(index),
                    "CidrBlock": cidr.to_string(),
                    "MapPublicIpOnLaunch": true,
                    "Tags": self.tag(&[id, name.as_str()]),
                    "VpcId": reference(&vpc),
                }),
                &[],
            );
            self.add(
                &[id, name.as_str(), "RouteTableAssociation"],
                "AWS::EC2::SubnetRouteTableAssociation",
                json!({
                    "RouteTableId": reference(&route_table),
                    "SubnetId": reference(&subnet),
                }),
                &[],
            );
            first_subnet.get_or_insert(subnet);
        }

        let first_subnet = first_subnet
            .ok_or_else(|| Error::synthesis(self.stack_id, format!("network '{id}' has no subnets")))?;

        Ok(EmittedNetwork {
            vpc,
            first_subnet,
            default_route,
        })
    }

    fn security_group(&mut self, id: &LogicalId, sg: &SecurityGroupDescriptor, vpc: &str) -> String {
        let id = id.as_str();
        let ingress: Vec<Value> = sg.ingress.iter().map(ingress_rule).collect();
        let egress = if sg.allow_all_outbound {
            json!([{
                "CidrIp": "0.0.0.0/0",
                "Description": "Allow all outbound traffic by default",
                "IpProtocol": "-1",
            }])
        } else {
            // An impossible rule replaces the implicit allow-all
            json!([{
                "CidrIp": "255.255.255.255/32",
                "Description": "Disallow all traffic",
                "FromPort": 252,
                "IpProtocol": "icmp",
                "ToPort": 86,
            }])
        };

        self.add(
            &[id, "Resource"],
            "AWS::EC2::SecurityGroup",
            json!({
                "GroupDescription": sg.description,
                "SecurityGroupEgress": egress,
                "SecurityGroupIngress": ingress,
                "Tags": self.tag(&[id]),
                "VpcId": reference(vpc),
            }),
            &[],
        )
    }

    fn instance(
        &mut self,
        id: &LogicalId,
        instance: &ComputeInstanceDescriptor,
        network: &EmittedNetwork,
        security_group: &str,
        user_data: String,
    ) -> String {
        let id = id.as_str();
        let image_id = match instance.machine_image.ssm_parameter() {
            Some(parameter) => {
                let name = self.image_parameter(parameter);
                reference(&name)
            }
            None => json!(instance.machine_image.to_string()),
        };

        self.add(
            &[id, "Resource"],
            "AWS::EC2::Instance",
            json!({
                "AvailabilityZone": availability_zone(0),
                "ImageId": image_id,
                "InstanceType": instance.instance_type.to_string(),
                "SecurityGroupIds": [{ "Fn::GetAtt": [security_group, "GroupId"] }],
                "SubnetId": reference(&network.first_subnet),
                "Tags": self.tag(&[id]),
                "UserData": { "Fn::Base64": user_data },
            }),
            &[network.default_route.as_str()],
        )
    }

    /// Declare the SSM-backed parameter resolving a generic image.
    fn image_parameter(&mut self, ssm_path: &str) -> String {
        let readable: String = ssm_path.chars().filter(char::is_ascii_alphanumeric).collect();
        let name = format!("SsmParameterValue{readable}{}Parameter", path_hash(ssm_path));
        self.parameters.entry(name.clone()).or_insert_with(|| {
            json!({
                "Type": IMAGE_PARAMETER_TYPE,
                "Default": ssm_path,
            })
        });
        name
    }

    fn finish(self, description: Option<&str>) -> Value {
        let mut template = Map::new();
        if let Some(description) = description {
            template.insert("Description".to_string(), json!(description));
        }
        if !self.parameters.is_empty() {
            template.insert("Parameters".to_string(), Value::Object(self.parameters));
        }
        template.insert("Resources".to_string(), Value::Object(self.resources));
        Value::Object(template)
    }
}

fn ingress_rule(rule: &IngressRule) -> Value {
    let mut entry = Map::new();
    entry.insert("CidrIp".to_string(), json!(rule.peer.to_string()));
    entry.insert("Description".to_string(), json!(rule.description));
    if rule.protocol != Protocol::All {
        entry.insert("FromPort".to_string(), json!(rule.ports.from));
    }
    entry.insert(
        "IpProtocol".to_string(),
        json!(rule.protocol.as_ip_protocol()),
    );
    if rule.protocol != Protocol::All {
        entry.insert("ToPort".to_string(), json!(rule.ports.to));
    }
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DeploymentParameters;
    use crate::stack::{StackProps, StackSettings, DEFAULT_STACK_ID};

    fn synth(settings: StackSettings) -> StackArtifact {
        let stack = Stack::new(
            DEFAULT_STACK_ID,
            StackProps::new(DeploymentParameters::default(), settings),
        )
        .unwrap();
        CloudFormationSynthesizer::new().synthesize(&stack).unwrap()
    }

    fn resources_of_type<'a>(artifact: &'a StackArtifact, ty: &str) -> Vec<(&'a String, &'a Value)> {
        artifact.template["Resources"]
            .as_object()
            .unwrap()
            .iter()
            .filter(|(_, r)| r["Type"] == ty)
            .collect()
    }

    #[test]
    fn test_logical_id_is_stable() {
        let a = logical_id("IaCKafkaEC2", &["MyVpc", "Resource"]);
        let b = logical_id("IaCKafkaEC2", &["MyVpc", "Resource"]);
        assert_eq!(a, b);
        assert!(a.starts_with("MyVpc"));
        assert_eq!(a.len(), "MyVpc".len() + 8);
        assert!(a[5..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(a, logical_id("Other", &["MyVpc", "Resource"]));
    }

    #[test]
    fn test_network_expansion() {
        let artifact = synth(StackSettings::default());
        assert_eq!(resources_of_type(&artifact, "AWS::EC2::VPC").len(), 1);
        assert_eq!(resources_of_type(&artifact, "AWS::EC2::Subnet").len(), 2);
        assert_eq!(
            resources_of_type(&artifact, "AWS::EC2::SubnetRouteTableAssociation").len(),
            2
        );
        assert_eq!(resources_of_type(&artifact, "AWS::EC2::Route").len(), 1);
        assert_eq!(
            resources_of_type(&artifact, "AWS::EC2::InternetGateway").len(),
            1
        );
    }

    #[test]
    fn test_security_group_rules() {
        let artifact = synth(StackSettings::default());
        let groups = resources_of_type(&artifact, "AWS::EC2::SecurityGroup");
        let props = &groups[0].1["Properties"];
        assert_eq!(props["GroupDescription"], "Allow SSH access to ec2 instances");
        assert_eq!(props["SecurityGroupIngress"][0]["CidrIp"], "0.0.0.0/0");
        assert_eq!(props["SecurityGroupIngress"][0]["FromPort"], 22);
        assert_eq!(props["SecurityGroupEgress"][0]["IpProtocol"], "-1");
    }

    #[test]
    fn test_outbound_can_be_closed() {
        let mut settings = StackSettings::default();
        settings.security.allow_all_outbound = false;
        let artifact = synth(settings);
        let groups = resources_of_type(&artifact, "AWS::EC2::SecurityGroup");
        let egress = &groups[0].1["Properties"]["SecurityGroupEgress"][0];
        assert_eq!(egress["CidrIp"], "255.255.255.255/32");
    }

    #[test]
    fn test_instance_properties() {
        let artifact = synth(StackSettings::default());
        let instances = resources_of_type(&artifact, "AWS::EC2::Instance");
        assert_eq!(instances.len(), 1);
        let (_, instance) = instances[0];
        let props = &instance["Properties"];
        assert_eq!(props["InstanceType"], "t2.large");

        let user_data = props["UserData"]["Fn::Base64"].as_str().unwrap();
        assert!(user_data.starts_with("#!/bin/bash\nsudo yum update -y\n"));
        assert!(user_data.ends_with("bin/zookeeper-server-start.sh config/zookeeper.properties"));

        let image_param = props["ImageId"]["Ref"].as_str().unwrap();
        assert_eq!(
            artifact.template["Parameters"][image_param]["Type"],
            IMAGE_PARAMETER_TYPE
        );
        assert_eq!(instance["DependsOn"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_fixed_ami_skips_parameter() {
        let mut settings = StackSettings::default();
        settings.instance.machine_image = "ami-0123456789abcdef0".to_string();
        let artifact = synth(settings);
        assert!(artifact.template.get("Parameters").is_none());
        let (_, instance) = resources_of_type(&artifact, "AWS::EC2::Instance")[0];
        assert_eq!(instance["Properties"]["ImageId"], "ami-0123456789abcdef0");
    }

    #[test]
    fn test_construct_paths() {
        let artifact = synth(StackSettings::default());
        let vpc_id = logical_id(DEFAULT_STACK_ID, &["MyVpc", "Resource"]);
        assert_eq!(
            artifact.construct_paths.get(&vpc_id).map(String::as_str),
            Some("IaCKafkaEC2/MyVpc/Resource")
        );
        assert_eq!(
            artifact.construct_paths.len(),
            artifact.template["Resources"].as_object().unwrap().len()
        );
    }
}
