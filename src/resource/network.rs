//! Virtual network descriptor.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::{Ipv4Cidr, LogicalId};
use crate::error::{Error, Result};

/// Default address space of a network.
pub const DEFAULT_NETWORK_CIDR: &str = "10.0.0.0/16";
/// Default number of availability zones a network spans.
pub const DEFAULT_MAX_AZS: u8 = 2;
/// Default prefix length of the per-zone subnets.
pub const DEFAULT_SUBNET_PREFIX: u8 = 24;

/// An isolated address space subdivided across availability zones.
///
/// The network knows nothing about the resources placed in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Address space
    pub cidr: Ipv4Cidr,
    /// Upper bound on availability zones
    pub max_azs: u8,
    /// Prefix length of each per-zone public subnet
    pub subnet_prefix: u8,
    /// Enable DNS support and hostnames
    pub enable_dns: bool,
}

impl Default for NetworkDescriptor {
    fn default() -> Self {
        Self {
            cidr: Ipv4Cidr::new_unchecked(Ipv4Addr::new(10, 0, 0, 0), 16),
            max_azs: DEFAULT_MAX_AZS,
            subnet_prefix: DEFAULT_SUBNET_PREFIX,
            enable_dns: true,
        }
    }
}

impl NetworkDescriptor {
    /// Create a network over `cidr` with default zone and subnet settings.
    pub fn new(cidr: Ipv4Cidr) -> Self {
        Self {
            cidr,
            ..Self::default()
        }
    }

    /// Set the availability zone bound.
    pub fn with_max_azs(mut self, max_azs: u8) -> Self {
        self.max_azs = max_azs;
        self
    }

    /// Set the per-zone subnet prefix length.
    pub fn with_subnet_prefix(mut self, prefix: u8) -> Self {
        self.subnet_prefix = prefix;
        self
    }

    /// One subnet block per availability zone, carved in order.
    pub fn subnet_cidrs(&self) -> Result<Vec<Ipv4Cidr>> {
        (0..u32::from(self.max_azs))
            .map(|i| self.cidr.subnet(self.subnet_prefix, i))
            .collect()
    }

    pub(crate) fn validate(&self, id: &LogicalId) -> Result<()> {
        if self.max_azs == 0 {
            return Err(Error::invalid_descriptor(
                id.as_str(),
                "max_azs must be at least 1",
            ));
        }
        if !(16..=28).contains(&self.cidr.prefix()) {
            return Err(Error::invalid_descriptor(
                id.as_str(),
                format!("network prefix /{} must be between /16 and /28", self.cidr.prefix()),
            ));
        }
        self.subnet_cidrs()
            .map(|_| ())
            .map_err(|e| Error::invalid_descriptor(id.as_str(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_network() {
        let network = NetworkDescriptor::default();
        assert_eq!(network.cidr.to_string(), DEFAULT_NETWORK_CIDR);
        assert_eq!(network.max_azs, 2);
        assert!(network.enable_dns);
    }

    #[test]
    fn test_subnet_cidrs() {
        let network = NetworkDescriptor::default().with_max_azs(3);
        let subnets: Vec<String> = network
            .subnet_cidrs()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(subnets, vec!["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"]);
    }

    #[test]
    fn test_validate_rejects_zero_azs() {
        let id = LogicalId::from("MyVpc");
        let err = NetworkDescriptor::default()
            .with_max_azs(0)
            .validate(&id)
            .unwrap_err();
        assert!(err.is_graph_error());
    }

    #[test]
    fn test_validate_rejects_too_many_subnets() {
        let id = LogicalId::from("MyVpc");
        let cidr: Ipv4Cidr = "10.0.0.0/24".parse().unwrap();
        let network = NetworkDescriptor::new(cidr)
            .with_subnet_prefix(25)
            .with_max_azs(3);
        assert!(network.validate(&id).is_err());
    }
}
