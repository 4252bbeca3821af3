//! Compute instance descriptor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ResourceRef;
use crate::error::{Error, Result};

/// Instance family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceClass {
    /// Burstable, previous generation
    T2,
    /// Burstable
    T3,
    /// Burstable, AMD
    T3a,
    /// General purpose
    M5,
    /// Compute optimized
    C5,
    /// Memory optimized
    R5,
}

impl InstanceClass {
    /// Lower-case family name.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceClass::T2 => "t2",
            InstanceClass::T3 => "t3",
            InstanceClass::T3a => "t3a",
            InstanceClass::M5 => "m5",
            InstanceClass::C5 => "c5",
            InstanceClass::R5 => "r5",
        }
    }
}

impl FromStr for InstanceClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "t2" => Ok(InstanceClass::T2),
            "t3" => Ok(InstanceClass::T3),
            "t3a" => Ok(InstanceClass::T3a),
            "m5" => Ok(InstanceClass::M5),
            "c5" => Ok(InstanceClass::C5),
            "r5" => Ok(InstanceClass::R5),
            _ => Err(Error::invalid_config(
                "instance_class",
                format!("unknown instance class '{s}'. Valid: t2, t3, t3a, m5, c5, r5"),
            )),
        }
    }
}

/// Instance size within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceSize {
    /// nano
    Nano,
    /// micro
    Micro,
    /// small
    Small,
    /// medium
    Medium,
    /// large
    Large,
    /// xlarge
    Xlarge,
    /// 2xlarge
    #[serde(rename = "2xlarge")]
    Xlarge2,
}

impl InstanceSize {
    /// Size name as it appears in an instance type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceSize::Nano => "nano",
            InstanceSize::Micro => "micro",
            InstanceSize::Small => "small",
            InstanceSize::Medium => "medium",
            InstanceSize::Large => "large",
            InstanceSize::Xlarge => "xlarge",
            InstanceSize::Xlarge2 => "2xlarge",
        }
    }
}

impl FromStr for InstanceSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nano" => Ok(InstanceSize::Nano),
            "micro" => Ok(InstanceSize::Micro),
            "small" => Ok(InstanceSize::Small),
            "medium" => Ok(InstanceSize::Medium),
            "large" => Ok(InstanceSize::Large),
            "xlarge" => Ok(InstanceSize::Xlarge),
            "2xlarge" => Ok(InstanceSize::Xlarge2),
            _ => Err(Error::invalid_config(
                "instance_size",
                format!("unknown instance size '{s}'"),
            )),
        }
    }
}

/// Family and size, e.g. `t2.large`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceType {
    /// Family
    pub class: InstanceClass,
    /// Size
    pub size: InstanceSize,
}

impl InstanceType {
    /// Combine a family and a size.
    pub const fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (class, size) = s.split_once('.').ok_or_else(|| {
            Error::invalid_config("instance_type", format!("expected <class>.<size>, got '{s}'"))
        })?;
        Ok(Self::of(class.parse()?, size.parse()?))
    }
}

/// Machine image an instance boots from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MachineImage {
    /// Latest Amazon Linux 2, resolved at deploy time
    AmazonLinux2,
    /// Latest Amazon Linux 2023, resolved at deploy time
    AmazonLinux2023,
    /// A fixed AMI id
    Ami(String),
}

impl MachineImage {
    /// Public SSM parameter holding the latest image id, for generic images.
    pub fn ssm_parameter(&self) -> Option<&'static str> {
        match self {
            MachineImage::AmazonLinux2 => {
                Some("/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2")
            }
            MachineImage::AmazonLinux2023 => {
                Some("/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64")
            }
            MachineImage::Ami(_) => None,
        }
    }
}

impl fmt::Display for MachineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineImage::AmazonLinux2 => f.write_str("amazon-linux-2"),
            MachineImage::AmazonLinux2023 => f.write_str("amazon-linux-2023"),
            MachineImage::Ami(id) => f.write_str(id),
        }
    }
}

impl FromStr for MachineImage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "amazon-linux-2" => Ok(MachineImage::AmazonLinux2),
            "amazon-linux-2023" => Ok(MachineImage::AmazonLinux2023),
            id if id.starts_with("ami-") && id.len() > 4 => Ok(MachineImage::Ami(id.to_string())),
            other => Err(Error::invalid_config(
                "machine_image",
                format!(
                    "unknown machine image '{other}'. Valid: amazon-linux-2, amazon-linux-2023, ami-<id>"
                ),
            )),
        }
    }
}

impl TryFrom<String> for MachineImage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MachineImage> for String {
    fn from(value: MachineImage) -> Self {
        value.to_string()
    }
}

/// A virtual machine placed in a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeInstanceDescriptor {
    /// Family and size
    pub instance_type: InstanceType,
    /// Boot image
    pub machine_image: MachineImage,
    /// Network the instance is placed in
    pub network: ResourceRef,
    /// Security group guarding the instance
    pub security_group: ResourceRef,
    /// First-boot script
    pub boot_script: ResourceRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_type_round_trip() {
        let t: InstanceType = "t2.large".parse().unwrap();
        assert_eq!(t, InstanceType::of(InstanceClass::T2, InstanceSize::Large));
        assert_eq!(t.to_string(), "t2.large");

        let big: InstanceType = "m5.2xlarge".parse().unwrap();
        assert_eq!(big.size, InstanceSize::Xlarge2);
    }

    #[test]
    fn test_instance_type_rejects_unknown() {
        assert!("t2".parse::<InstanceType>().is_err());
        assert!("z9.large".parse::<InstanceType>().is_err());
        assert!("t2.huge".parse::<InstanceType>().is_err());
    }

    #[test]
    fn test_machine_image() {
        let image: MachineImage = "amazon-linux-2".parse().unwrap();
        assert_eq!(image, MachineImage::AmazonLinux2);
        assert!(image.ssm_parameter().unwrap().contains("amzn2"));

        let ami: MachineImage = "ami-0abcdef1234567890".parse().unwrap();
        assert_eq!(ami.ssm_parameter(), None);
        assert!("ami-".parse::<MachineImage>().is_err());
        assert!("ubuntu".parse::<MachineImage>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&InstanceSize::Xlarge2).unwrap();
        assert_eq!(json, "\"2xlarge\"");
        let class: InstanceClass = serde_json::from_str("\"t3a\"").unwrap();
        assert_eq!(class, InstanceClass::T3a);
    }
}
