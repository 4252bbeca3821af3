//! Security group descriptor and ingress rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Ipv4Cidr, LogicalId, ResourceRef};
use crate::error::{Error, Result};

/// IP protocol of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
    /// Every protocol
    All,
}

impl Protocol {
    /// Protocol identifier as the EC2 API spells it.
    pub fn as_ip_protocol(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::All => f.write_str("all"),
            other => f.write_str(other.as_ip_protocol()),
        }
    }
}

/// Inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    /// First port
    pub from: u16,
    /// Last port
    pub to: u16,
}

impl PortRange {
    /// A single port.
    pub const fn single(port: u16) -> Self {
        Self {
            from: port,
            to: port,
        }
    }

    /// A span of ports.
    pub const fn range(from: u16, to: u16) -> Self {
        Self { from, to }
    }

    /// Every port.
    pub const fn all() -> Self {
        Self {
            from: 0,
            to: u16::MAX,
        }
    }

    /// Whether `port` falls inside the range.
    pub fn contains(&self, port: u16) -> bool {
        (self.from..=self.to).contains(&port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// An inbound allow rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngressRule {
    /// Source address block
    pub peer: Ipv4Cidr,
    /// Protocol
    pub protocol: Protocol,
    /// Ports
    pub ports: PortRange,
    /// Rule description
    pub description: String,
}

impl IngressRule {
    /// Allow TCP traffic on one port from `peer`.
    pub fn tcp(peer: Ipv4Cidr, port: u16, description: impl Into<String>) -> Self {
        Self {
            peer,
            protocol: Protocol::Tcp,
            ports: PortRange::single(port),
            description: description.into(),
        }
    }

    /// Whether the source is `0.0.0.0/0`.
    pub fn is_open_to_world(&self) -> bool {
        self.peer.is_unrestricted()
    }

    /// Whether this rule admits `protocol` traffic on `port`.
    pub fn admits(&self, protocol: Protocol, port: u16) -> bool {
        (self.protocol == Protocol::All || self.protocol == protocol) && self.ports.contains(port)
    }
}

/// A named set of allow rules scoped to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupDescriptor {
    /// Group description
    pub description: String,
    /// Network the group belongs to
    pub network: ResourceRef,
    /// Allow every outbound connection
    pub allow_all_outbound: bool,
    /// Inbound allow list
    pub ingress: Vec<IngressRule>,
}

impl SecurityGroupDescriptor {
    /// Create a group with no inbound rules and unrestricted outbound traffic.
    pub fn new(network: ResourceRef, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            network,
            allow_all_outbound: true,
            ingress: Vec::new(),
        }
    }

    /// Set the outbound policy.
    pub fn with_allow_all_outbound(mut self, allow: bool) -> Self {
        self.allow_all_outbound = allow;
        self
    }

    /// Append an inbound rule.
    pub fn add_ingress_rule(&mut self, rule: IngressRule) {
        self.ingress.push(rule);
    }

    /// Rules admitting `protocol`/`port` traffic.
    pub fn rules_for(&self, protocol: Protocol, port: u16) -> Vec<&IngressRule> {
        self.ingress
            .iter()
            .filter(|r| r.admits(protocol, port))
            .collect()
    }

    pub(crate) fn validate(&self, id: &LogicalId) -> Result<()> {
        if self.description.len() > 255 {
            return Err(Error::invalid_descriptor(
                id.as_str(),
                "description exceeds 255 characters",
            ));
        }

        for rule in &self.ingress {
            if rule.ports.from > rule.ports.to {
                return Err(Error::invalid_descriptor(
                    id.as_str(),
                    format!("port range {}-{} is reversed", rule.ports.from, rule.ports.to),
                ));
            }
            if rule.peer.is_unrestricted() {
                tracing::debug!(
                    "{} admits {} {} from {}",
                    id,
                    rule.protocol,
                    rule.ports,
                    rule.peer
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn group() -> SecurityGroupDescriptor {
        SecurityGroupDescriptor::new(ResourceRef::new("MyVpc", ResourceKind::Network), "test")
    }

    #[test]
    fn test_new_group_defaults() {
        let sg = group();
        assert!(sg.allow_all_outbound);
        assert!(sg.ingress.is_empty());
    }

    #[test]
    fn test_rules_for() {
        let mut sg = group();
        sg.add_ingress_rule(IngressRule::tcp(Ipv4Cidr::any(), 22, "ssh"));
        assert_eq!(sg.rules_for(Protocol::Tcp, 22).len(), 1);
        assert!(sg.rules_for(Protocol::Udp, 22).is_empty());
        assert!(sg.rules_for(Protocol::Tcp, 80).is_empty());
    }

    #[test]
    fn test_all_protocol_admits_everything() {
        let rule = IngressRule {
            peer: "10.0.0.0/8".parse().unwrap(),
            protocol: Protocol::All,
            ports: PortRange::all(),
            description: String::new(),
        };
        assert!(rule.admits(Protocol::Udp, 53));
        assert!(!rule.is_open_to_world());
    }

    #[test]
    fn test_validate_reversed_range() {
        let mut sg = group();
        sg.add_ingress_rule(IngressRule {
            peer: Ipv4Cidr::any(),
            protocol: Protocol::Tcp,
            ports: PortRange::range(100, 10),
            description: String::new(),
        });
        assert!(sg.validate(&LogicalId::from("Sg")).is_err());
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::Tcp.to_string(), "tcp");
        assert_eq!(Protocol::All.to_string(), "all");
        assert_eq!(Protocol::All.as_ip_protocol(), "-1");
    }
}
