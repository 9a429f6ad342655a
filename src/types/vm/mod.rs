//! Compute instance types
//!
//! Identity, status and the properties shared by both guest kinds. The
//! kind-specific CPU and memory tables live in [`lxc`] and [`qemu`].

pub mod lxc;
pub mod qemu;

pub use lxc::{LxcConfig, LxcCpuProperties, LxcCreateOptions, LxcMemoryProperties};
pub use qemu::{QemuConfig, QemuCpuProperties, QemuMemoryProperties};

use super::codec::{keys_of, Literal, PropertyDescriptor};
use super::properties::Properties;
use crate::api::RequestValues;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Hypervisor kind of a guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Qemu,
    Lxc,
}

impl Kind {
    pub const ALL: &'static [&'static str] = &["qemu", "lxc"];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Qemu => "qemu",
            Kind::Lxc => "lxc",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "qemu" => Ok(Kind::Qemu),
            "lxc" => Ok(Kind::Lxc),
            other => Err(Error::invalid("type", other)),
        }
    }
}

/// Runtime status reported by `status/current`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Stopped,
    Paused,
}

impl Status {
    pub const ALL: &'static [&'static str] = &["running", "stopped", "paused"];
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(Status::Running),
            "stopped" => Ok(Status::Stopped),
            "paused" => Ok(Status::Paused),
            other => Err(Error::invalid("status", other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Running => "running",
            Status::Stopped => "stopped",
            Status::Paused => "paused",
        };
        f.write_str(s)
    }
}

const VMID: PropertyDescriptor = PropertyDescriptor::uint("vmid", 100, 999_999_999);
const TYPE: PropertyDescriptor = PropertyDescriptor::enumeration("type", Kind::ALL);
const NODE: PropertyDescriptor = PropertyDescriptor::string("node");
const TEMPLATE: PropertyDescriptor =
    PropertyDescriptor::boolean("template").with_default(Literal::Bool(false));

/// Identity of a guest as found in `cluster/resources`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmIdentity {
    pub vmid: u32,
    pub kind: Kind,
    pub node: String,
    pub template: bool,
}

impl VmIdentity {
    pub fn new(vmid: u32, kind: Kind, node: impl Into<String>) -> Self {
        Self {
            vmid,
            kind,
            node: node.into(),
            template: false,
        }
    }

    /// Decode one listing row
    pub fn from_listing(bag: &Properties) -> Result<Self> {
        Ok(Self {
            vmid: VMID.decode_uint(bag)?,
            kind: TYPE.decode_enum(bag)?,
            node: NODE.decode_string(bag)?,
            template: TEMPLATE.decode_bool(bag)?,
        })
    }
}

const NAME: PropertyDescriptor = PropertyDescriptor::string("name").with_default(Literal::Str(""));
const HOSTNAME: PropertyDescriptor =
    PropertyDescriptor::string("hostname").with_default(Literal::Str(""));
const DESCRIPTION: PropertyDescriptor =
    PropertyDescriptor::string("description").with_default(Literal::Str(""));

impl Kind {
    /// QEMU names a guest with `name`, LXC with `hostname`
    fn name_property(self) -> PropertyDescriptor {
        match self {
            Kind::Qemu => NAME,
            Kind::Lxc => HOSTNAME,
        }
    }
}

/// Properties common to QEMU and LXC guests.
///
/// The codec takes the guest [`Kind`] because the name key differs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VmProperties {
    pub name: String,
    pub description: String,
    pub template: bool,
}

impl VmProperties {
    pub fn known_keys(kind: Kind) -> Vec<&'static str> {
        keys_of(&[kind.name_property(), DESCRIPTION, TEMPLATE])
    }

    pub fn decode(kind: Kind, bag: &Properties) -> Result<Self> {
        Ok(Self {
            name: kind.name_property().decode_string(bag)?,
            description: DESCRIPTION.decode_string(bag)?,
            template: TEMPLATE.decode_bool(bag)?,
        })
    }

    /// Empty strings are left out so an update never blanks server values;
    /// `template` is one-way and only sent when set.
    pub fn encode(&self, kind: Kind) -> Result<RequestValues> {
        let mut values = RequestValues::new();

        if !self.name.is_empty() {
            values.add_string(kind.name_property().name, self.name.as_str());
        }
        if !self.description.is_empty() {
            values.add_string(DESCRIPTION.name, self.description.as_str());
        }
        if self.template {
            values.add_bool(TEMPLATE.name, true);
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: serde_json::Value) -> Properties {
        Properties::from_value(value).unwrap()
    }

    #[test]
    fn test_identity_from_listing_row() {
        let row = bag(json!({
            "id": "lxc/101",
            "vmid": 101,
            "type": "lxc",
            "node": "pve1",
            "template": 0,
            "status": "running"
        }));

        let identity = VmIdentity::from_listing(&row).unwrap();
        assert_eq!(identity, VmIdentity::new(101, Kind::Lxc, "pve1"));
    }

    #[test]
    fn test_identity_rejects_unknown_type() {
        let row = bag(json!({"vmid": 101, "type": "openvz", "node": "pve1"}));
        assert!(matches!(
            VmIdentity::from_listing(&row),
            Err(Error::InvalidProperty { ref name, .. }) if name == "type"
        ));
    }

    #[test]
    fn test_vm_properties_defaults() {
        let props = VmProperties::decode(Kind::Qemu, &bag(json!({}))).unwrap();
        assert_eq!(props, VmProperties::default());
        assert!(props.encode(Kind::Qemu).unwrap().is_empty());
    }

    #[test]
    fn test_vm_properties_encode() {
        let props = VmProperties {
            name: "web01".to_string(),
            description: String::new(),
            template: true,
        };
        let values = props.encode(Kind::Qemu).unwrap();
        assert_eq!(values.get("name"), Some("web01"));
        assert!(!values.contains_key("description"));
        assert_eq!(values.get("template"), Some("1"));
    }

    #[test]
    fn test_container_name_uses_hostname() {
        let record = bag(json!({"hostname": "ct101", "name": "ignored"}));
        let props = VmProperties::decode(Kind::Lxc, &record).unwrap();
        assert_eq!(props.name, "ct101");
        assert_eq!(VmProperties::known_keys(Kind::Lxc), vec!["hostname", "description", "template"]);

        let values = props.encode(Kind::Lxc).unwrap();
        assert_eq!(values.get("hostname"), Some("ct101"));
        assert!(!values.contains_key("name"));
    }

    #[test]
    fn test_kind_and_status_parse() {
        assert_eq!("qemu".parse::<Kind>().unwrap(), Kind::Qemu);
        assert!("kvm".parse::<Kind>().is_err());
        assert_eq!("paused".parse::<Status>().unwrap(), Status::Paused);
        assert_eq!(Status::Running.to_string(), "running");
    }
}
