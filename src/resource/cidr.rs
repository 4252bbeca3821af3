//! IPv4 CIDR blocks.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An IPv4 network in CIDR notation, e.g. `10.0.0.0/16`.
///
/// Host bits must be zero; `10.0.0.1/16` is rejected rather than silently
/// truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Create a CIDR block from a network address and prefix length.
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(Error::invalid_cidr(
                format!("{network}/{prefix}"),
                "prefix length must be between 0 and 32",
            ));
        }

        let raw = u32::from(network);
        if raw & !mask(prefix) != 0 {
            return Err(Error::invalid_cidr(
                format!("{network}/{prefix}"),
                "host bits must be zero",
            ));
        }

        Ok(Self { network, prefix })
    }

    /// Caller guarantees host bits are zero and `prefix <= 32`.
    pub(crate) const fn new_unchecked(network: Ipv4Addr, prefix: u8) -> Self {
        Self { network, prefix }
    }

    /// `0.0.0.0/0`, every IPv4 address.
    pub const fn any() -> Self {
        Self {
            network: Ipv4Addr::UNSPECIFIED,
            prefix: 0,
        }
    }

    /// Network address.
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Prefix length.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// True for `0.0.0.0/0`.
    pub fn is_unrestricted(&self) -> bool {
        self.prefix == 0
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    /// Whether `other` lies entirely inside this block.
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix
            && u32::from(other.network) & mask(self.prefix) == u32::from(self.network)
    }

    /// The `index`-th subnet of length `new_prefix` carved from this block.
    pub fn subnet(&self, new_prefix: u8, index: u32) -> Result<Ipv4Cidr> {
        if new_prefix < self.prefix || new_prefix > 32 {
            return Err(Error::invalid_cidr(
                self.to_string(),
                format!("cannot carve /{new_prefix} subnets"),
            ));
        }

        let count = 1u64 << u32::from(new_prefix - self.prefix);
        if u64::from(index) >= count {
            return Err(Error::invalid_cidr(
                self.to_string(),
                format!("only {count} /{new_prefix} subnets fit, index {index} requested"),
            ));
        }

        let offset = u64::from(index) << (32 - u32::from(new_prefix));
        let base = u64::from(u32::from(self.network)) + offset;
        // base stays below 2^32: offset < size of self
        let base = u32::try_from(base)
            .map_err(|_| Error::invalid_cidr(self.to_string(), "subnet overflows address space"))?;

        Ipv4Cidr::new(Ipv4Addr::from(base), new_prefix)
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::invalid_cidr(s, "expected <address>/<prefix>"))?;

        let network: Ipv4Addr = addr
            .parse()
            .map_err(|e| Error::invalid_cidr(s, format!("bad address: {e}")))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|e| Error::invalid_cidr(s, format!("bad prefix: {e}")))?;

        Self::new(network, prefix)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(value: Ipv4Cidr) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let cidr: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(cidr.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(cidr.prefix(), 16);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
        assert_eq!(cidr.size(), 65536);
    }

    #[test]
    fn test_any() {
        let any: Ipv4Cidr = "0.0.0.0/0".parse().unwrap();
        assert_eq!(any, Ipv4Cidr::any());
        assert!(any.is_unrestricted());
        assert_eq!(any.size(), 1 << 32);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("10.0.0.0".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.256/16".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.1/16".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/x".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_subnets() {
        let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(vpc.subnet(24, 0).unwrap().to_string(), "10.0.0.0/24");
        assert_eq!(vpc.subnet(24, 1).unwrap().to_string(), "10.0.1.0/24");
        assert_eq!(vpc.subnet(18, 3).unwrap().to_string(), "10.0.192.0/18");
        assert!(vpc.subnet(18, 4).is_err());
        assert!(vpc.subnet(8, 0).is_err());
        assert!(vpc.contains(&vpc.subnet(28, 100).unwrap()));
    }

    #[test]
    fn test_contains() {
        let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        let other: Ipv4Cidr = "10.1.0.0/24".parse().unwrap();
        assert!(!vpc.contains(&other));
        assert!(Ipv4Cidr::any().contains(&other));
    }

    #[test]
    fn test_serde_as_string() {
        let cidr: Ipv4Cidr = serde_json::from_str("\"192.168.0.0/24\"").unwrap();
        assert_eq!(serde_json::to_string(&cidr).unwrap(), "\"192.168.0.0/24\"");
        assert!(serde_json::from_str::<Ipv4Cidr>("\"192.168.0.1/24\"").is_err());
    }
}
