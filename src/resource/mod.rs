//! Typed resource descriptors.
//!
//! A descriptor is a plain, write-once record describing one infrastructure
//! object. Descriptors never hold pointers to each other: a dependent names
//! its dependency through a [`ResourceRef`] (logical id plus expected kind),
//! and the [`ResourceGraph`] turns those names into edges.
//!
//! ```text
//!   Network ◀──────── SecurityGroup
//!      ▲                    ▲
//!      └────── Instance ────┘
//!                 │
//!                 ▼
//!            BootScript
//! ```

pub mod boot;
pub mod cidr;
pub mod compute;
pub mod graph;
pub mod network;
pub mod security;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use boot::{BootCommand, BootScript};
pub use cidr::Ipv4Cidr;
pub use compute::{ComputeInstanceDescriptor, InstanceClass, InstanceSize, InstanceType, MachineImage};
pub use graph::{Reference, ResourceGraph, ResourceNode};
pub use network::NetworkDescriptor;
pub use security::{IngressRule, PortRange, Protocol, SecurityGroupDescriptor};

/// Identifier of a resource within its stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Create a logical id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LogicalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of a resource descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Virtual network
    Network,
    /// Security group
    SecurityGroup,
    /// First-boot script
    BootScript,
    /// Compute instance
    Instance,
}

impl ResourceKind {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Network => "network",
            ResourceKind::SecurityGroup => "security group",
            ResourceKind::BootScript => "boot script",
            ResourceKind::Instance => "instance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference from one descriptor to another.
///
/// Only [`ResourceGraph::add`] hands these out, so holding one means the
/// target was declared first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Target logical id
    pub id: LogicalId,
    /// Target kind
    pub kind: ResourceKind,
}

impl ResourceRef {
    /// Create a reference.
    pub fn new(id: impl Into<LogicalId>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// One outgoing reference field of a descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    /// Field name on the referencing descriptor
    pub field: &'static str,
    /// Kind the field requires
    pub expected: ResourceKind,
    /// The reference itself
    pub target: &'a ResourceRef,
}

/// Any resource descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// Virtual network
    Network(NetworkDescriptor),
    /// Security group
    SecurityGroup(SecurityGroupDescriptor),
    /// First-boot script
    BootScript(BootScript),
    /// Compute instance
    Instance(ComputeInstanceDescriptor),
}

impl Resource {
    /// Kind of this descriptor.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Network(_) => ResourceKind::Network,
            Resource::SecurityGroup(_) => ResourceKind::SecurityGroup,
            Resource::BootScript(_) => ResourceKind::BootScript,
            Resource::Instance(_) => ResourceKind::Instance,
        }
    }

    /// Outgoing references, in field order.
    pub fn references(&self) -> Vec<FieldRef<'_>> {
        match self {
            Resource::Network(_) | Resource::BootScript(_) => Vec::new(),
            Resource::SecurityGroup(sg) => vec![FieldRef {
                field: "network",
                expected: ResourceKind::Network,
                target: &sg.network,
            }],
            Resource::Instance(instance) => vec![
                FieldRef {
                    field: "network",
                    expected: ResourceKind::Network,
                    target: &instance.network,
                },
                FieldRef {
                    field: "security_group",
                    expected: ResourceKind::SecurityGroup,
                    target: &instance.security_group,
                },
                FieldRef {
                    field: "boot_script",
                    expected: ResourceKind::BootScript,
                    target: &instance.boot_script,
                },
            ],
        }
    }

    /// Descriptor-local validation.
    pub fn validate(&self, id: &LogicalId) -> Result<()> {
        match self {
            Resource::Network(network) => network.validate(id),
            Resource::SecurityGroup(sg) => sg.validate(id),
            Resource::BootScript(script) => script.validate(id),
            Resource::Instance(_) => Ok(()),
        }
    }

    /// The network descriptor, if this is one.
    pub fn as_network(&self) -> Option<&NetworkDescriptor> {
        match self {
            Resource::Network(n) => Some(n),
            _ => None,
        }
    }

    /// The security group descriptor, if this is one.
    pub fn as_security_group(&self) -> Option<&SecurityGroupDescriptor> {
        match self {
            Resource::SecurityGroup(sg) => Some(sg),
            _ => None,
        }
    }

    /// The boot script, if this is one.
    pub fn as_boot_script(&self) -> Option<&BootScript> {
        match self {
            Resource::BootScript(s) => Some(s),
            _ => None,
        }
    }

    /// The instance descriptor, if this is one.
    pub fn as_instance(&self) -> Option<&ComputeInstanceDescriptor> {
        match self {
            Resource::Instance(i) => Some(i),
            _ => None,
        }
    }
}

impl From<NetworkDescriptor> for Resource {
    fn from(value: NetworkDescriptor) -> Self {
        Resource::Network(value)
    }
}

impl From<SecurityGroupDescriptor> for Resource {
    fn from(value: SecurityGroupDescriptor) -> Self {
        Resource::SecurityGroup(value)
    }
}

impl From<BootScript> for Resource {
    fn from(value: BootScript) -> Self {
        Resource::BootScript(value)
    }
}

impl From<ComputeInstanceDescriptor> for Resource {
    fn from(value: ComputeInstanceDescriptor) -> Self {
        Resource::Instance(value)
    }
}
