//! LXC container properties

use super::{Kind, VmProperties, VMID};
use crate::api::RequestValues;
use crate::error::{Error, Result};
use crate::types::codec::{keys_of, Literal, PropertyCodec, PropertyDescriptor};
use crate::types::properties::Properties;
use serde::Serialize;

const CORES: PropertyDescriptor = PropertyDescriptor::uint("cores", 1, 128);
const CPU_LIMIT: PropertyDescriptor =
    PropertyDescriptor::uint("cpulimit", 0, 128).with_default(Literal::UInt(0));
const CPU_UNITS: PropertyDescriptor =
    PropertyDescriptor::uint("cpuunits", 8, 500_000).with_default(Literal::UInt(1024));

const CPU_DESCRIPTORS: &[PropertyDescriptor] = &[CORES, CPU_LIMIT, CPU_UNITS];

pub const DEFAULT_CPU_LIMIT: u32 = 0;
pub const DEFAULT_CPU_UNITS: u32 = 1024;

/// CPU allocation of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LxcCpuProperties {
    pub cores: u32,
    /// 0 means unlimited
    pub limit: u32,
    pub units: u32,
}

impl Default for LxcCpuProperties {
    fn default() -> Self {
        Self {
            cores: 1,
            limit: DEFAULT_CPU_LIMIT,
            units: DEFAULT_CPU_UNITS,
        }
    }
}

impl PropertyCodec for LxcCpuProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(CPU_DESCRIPTORS)
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            cores: CORES.decode_uint(bag)?,
            limit: CPU_LIMIT.decode_uint(bag)?,
            units: CPU_UNITS.decode_uint(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();

        let cores = if self.cores == 0 { 1 } else { self.cores };
        values.add_uint(CORES.name, CORES.check_uint(cores.into())?);

        CPU_LIMIT.check_uint(self.limit.into())?;
        if self.limit != 0 {
            values.add_uint(CPU_LIMIT.name, self.limit.into());
        }

        if self.units != 0 {
            values.add_uint(CPU_UNITS.name, CPU_UNITS.check_uint(self.units.into())?);
        }

        Ok(values)
    }
}

const MEMORY: PropertyDescriptor = PropertyDescriptor::uint("memory", 16, u64::MAX);
const SWAP: PropertyDescriptor = PropertyDescriptor::uint("swap", 0, u64::MAX);

const MEMORY_DESCRIPTORS: &[PropertyDescriptor] = &[MEMORY, SWAP];

pub const DEFAULT_MEMORY: u64 = 512;

/// Memory allocation of a container, in MiB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LxcMemoryProperties {
    pub memory: u64,
    pub swap: u64,
}

impl PropertyCodec for LxcMemoryProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(MEMORY_DESCRIPTORS)
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            memory: MEMORY.decode_uint(bag)?,
            swap: SWAP.decode_uint(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();

        let memory = if self.memory == 0 {
            DEFAULT_MEMORY
        } else {
            self.memory
        };
        values.add_uint(MEMORY.name, MEMORY.check_uint(memory)?);
        values.add_uint(SWAP.name, SWAP.check_uint(self.swap)?);

        Ok(values)
    }
}

/// Full typed configuration of a container
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LxcConfig {
    pub general: VmProperties,
    pub cpu: LxcCpuProperties,
    pub memory: LxcMemoryProperties,
}

impl PropertyCodec for LxcConfig {
    fn known_keys() -> Vec<&'static str> {
        let mut keys = VmProperties::known_keys(Kind::Lxc);
        keys.extend(LxcCpuProperties::known_keys());
        keys.extend(LxcMemoryProperties::known_keys());
        keys
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            general: VmProperties::decode(Kind::Lxc, bag)?,
            cpu: LxcCpuProperties::decode(bag)?,
            memory: LxcMemoryProperties::decode(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = self.general.encode(Kind::Lxc)?;
        values.extend(self.cpu.encode()?);
        values.extend(self.memory.encode()?);
        Ok(values)
    }
}

/// Parameters for creating a container from an OS template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LxcCreateOptions {
    pub vmid: u32,
    pub node: String,

    pub ostemplate_storage: String,
    pub ostemplate: String,

    pub rootfs_storage: String,
    /// Root filesystem size in GiB
    pub rootfs_size: u32,

    pub config: LxcConfig,
}

impl LxcCreateOptions {
    /// Encode the creation request; `node` travels in the path
    pub fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();

        values.add_uint(VMID.name, VMID.check_uint(self.vmid.into())?);
        values.add_string(
            "ostemplate",
            format!("{}:vztmpl/{}", self.ostemplate_storage, self.ostemplate),
        );

        if self.rootfs_size == 0 {
            return Err(Error::invalid("rootfs", self.rootfs_size));
        }
        values.add_string(
            "rootfs",
            format!("{}:{}", self.rootfs_storage, self.rootfs_size),
        );

        values.extend(self.config.encode()?);

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::codec::Detail;
    use serde_json::json;

    fn bag(value: serde_json::Value) -> Properties {
        Properties::from_value(value).unwrap()
    }

    #[test]
    fn test_memory_properties() {
        let detail = Detail::<LxcMemoryProperties>::decode(bag(json!({
            "memory": 4096,
            "swap": 2048
        })))
        .unwrap();

        assert_eq!(
            detail.properties,
            LxcMemoryProperties {
                memory: 4096,
                swap: 2048
            }
        );
        assert!(detail.extras.is_empty());
    }

    #[test]
    fn test_memory_required_properties() {
        let full = json!({"memory": 4096, "swap": 2048});
        for name in ["memory", "swap"] {
            let mut props = bag(full.clone());
            props.remove(name);
            match LxcMemoryProperties::decode(&props) {
                Err(Error::MissingProperty { name: missing }) => assert_eq!(missing, name),
                other => panic!("expected MissingProperty for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_cpu_missing_cores() {
        let err = LxcCpuProperties::decode(&bag(json!({"cpulimit": 2, "cpuunits": 1024})))
            .unwrap_err();
        assert!(matches!(err, Error::MissingProperty { ref name } if name == "cores"));
    }

    #[test]
    fn test_cpu_defaults() {
        let cpu = LxcCpuProperties::decode(&bag(json!({"cores": 2}))).unwrap();
        assert_eq!(
            cpu,
            LxcCpuProperties {
                cores: 2,
                limit: DEFAULT_CPU_LIMIT,
                units: DEFAULT_CPU_UNITS
            }
        );
    }

    #[test]
    fn test_cpu_ranges() {
        assert!(LxcCpuProperties::decode(&bag(json!({"cores": 128}))).is_ok());
        assert!(LxcCpuProperties::decode(&bag(json!({"cores": 129}))).is_err());
        assert!(LxcCpuProperties::decode(&bag(json!({"cores": 2, "cpuunits": 7}))).is_err());
        assert!(LxcCpuProperties::decode(&bag(json!({"cores": 2, "cpuunits": 500000}))).is_ok());
        assert!(LxcCpuProperties::decode(&bag(json!({"cores": 1.5}))).is_err());
    }

    #[test]
    fn test_cpu_encode_defaults_and_omissions() {
        let cpu = LxcCpuProperties {
            cores: 0,
            limit: 0,
            units: 0,
        };
        let values = cpu.encode().unwrap();
        assert_eq!(values.get("cores"), Some("1"));
        assert!(!values.contains_key("cpulimit"));
        assert!(!values.contains_key("cpuunits"));
    }

    #[test]
    fn test_cpu_encode_rejects_out_of_range() {
        let cpu = LxcCpuProperties {
            cores: 2,
            limit: 200,
            units: 1024,
        };
        assert!(matches!(
            cpu.encode(),
            Err(Error::InvalidProperty { ref name, .. }) if name == "cpulimit"
        ));

        let cpu = LxcCpuProperties {
            cores: 2,
            limit: 0,
            units: 4,
        };
        assert!(cpu.encode().is_err());
    }

    #[test]
    fn test_memory_encode() {
        let values = LxcMemoryProperties { memory: 0, swap: 0 }.encode().unwrap();
        assert_eq!(values.get("memory"), Some("512"));
        assert_eq!(values.get("swap"), Some("0"));

        assert!(LxcMemoryProperties { memory: 8, swap: 0 }.encode().is_err());
    }

    #[test]
    fn test_config_extras() {
        let detail = Detail::<LxcConfig>::decode(bag(json!({
            "hostname": "ct101",
            "cores": 2,
            "memory": 1024,
            "swap": 512,
            "net0": "name=eth0,bridge=vmbr0,ip=dhcp",
            "digest": "7a8f0c"
        })))
        .unwrap();

        assert_eq!(detail.properties.cpu.cores, 2);
        assert_eq!(detail.properties.general.name, "ct101");
        let mut extras: Vec<&str> = detail.extras.keys().collect();
        extras.sort();
        assert_eq!(extras, vec!["digest", "net0"]);
    }

    #[test]
    fn test_create_options_encode() {
        let options = LxcCreateOptions {
            vmid: 120,
            node: "pve1".to_string(),
            ostemplate_storage: "local".to_string(),
            ostemplate: "debian-12-standard_12.2-1_amd64.tar.zst".to_string(),
            rootfs_storage: "local-lvm".to_string(),
            rootfs_size: 8,
            config: LxcConfig {
                cpu: LxcCpuProperties {
                    cores: 2,
                    ..Default::default()
                },
                memory: LxcMemoryProperties {
                    memory: 1024,
                    swap: 512,
                },
                ..Default::default()
            },
        };

        let values = options.encode().unwrap();
        let keys: Vec<&str> = values.keys().collect();
        assert_eq!(
            keys,
            vec!["vmid", "ostemplate", "rootfs", "cores", "cpuunits", "memory", "swap"]
        );
        assert_eq!(
            values.get("ostemplate"),
            Some("local:vztmpl/debian-12-standard_12.2-1_amd64.tar.zst")
        );
        assert_eq!(values.get("rootfs"), Some("local-lvm:8"));
    }

    #[test]
    fn test_create_options_reject_empty_rootfs() {
        let options = LxcCreateOptions {
            vmid: 120,
            node: "pve1".to_string(),
            ostemplate_storage: "local".to_string(),
            ostemplate: "alpine.tar.xz".to_string(),
            rootfs_storage: "local-lvm".to_string(),
            rootfs_size: 0,
            config: LxcConfig::default(),
        };
        assert!(options.encode().is_err());
    }
}
