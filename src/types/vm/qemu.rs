//! QEMU virtual machine properties

use super::{Kind, VmProperties};
use crate::api::RequestValues;
use crate::error::Result;
use crate::types::codec::{keys_of, Literal, PropertyCodec, PropertyDescriptor};
use crate::types::properties::Properties;
use serde::Serialize;

const CORES: PropertyDescriptor =
    PropertyDescriptor::uint("cores", 1, 128).with_default(Literal::UInt(1));
const SOCKETS: PropertyDescriptor =
    PropertyDescriptor::uint("sockets", 1, 4).with_default(Literal::UInt(1));
const CPU_LIMIT: PropertyDescriptor =
    PropertyDescriptor::uint("cpulimit", 0, 128).with_default(Literal::UInt(0));
const CPU_UNITS: PropertyDescriptor =
    PropertyDescriptor::uint("cpuunits", 1, 262_144).with_default(Literal::UInt(1024));
const NUMA: PropertyDescriptor =
    PropertyDescriptor::boolean("numa").with_default(Literal::Bool(false));

const CPU_DESCRIPTORS: &[PropertyDescriptor] = &[CORES, SOCKETS, CPU_LIMIT, CPU_UNITS, NUMA];

/// CPU topology and scheduling weight of a VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QemuCpuProperties {
    pub cores: u32,
    pub sockets: u32,
    /// 0 means unlimited
    pub limit: u32,
    pub units: u32,
    pub numa: bool,
}

impl Default for QemuCpuProperties {
    fn default() -> Self {
        Self {
            cores: 1,
            sockets: 1,
            limit: 0,
            units: 1024,
            numa: false,
        }
    }
}

impl QemuCpuProperties {
    pub fn vcpus(&self) -> u32 {
        self.cores.saturating_mul(self.sockets)
    }
}

impl PropertyCodec for QemuCpuProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(CPU_DESCRIPTORS)
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            cores: CORES.decode_uint(bag)?,
            sockets: SOCKETS.decode_uint(bag)?,
            limit: CPU_LIMIT.decode_uint(bag)?,
            units: CPU_UNITS.decode_uint(bag)?,
            numa: NUMA.decode_bool(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();

        let cores = self.cores.max(1);
        values.add_uint(CORES.name, CORES.check_uint(cores.into())?);

        let sockets = self.sockets.max(1);
        values.add_uint(SOCKETS.name, SOCKETS.check_uint(sockets.into())?);

        CPU_LIMIT.check_uint(self.limit.into())?;
        if self.limit != 0 {
            values.add_uint(CPU_LIMIT.name, self.limit.into());
        }

        if self.units != 0 {
            values.add_uint(CPU_UNITS.name, CPU_UNITS.check_uint(self.units.into())?);
        }

        values.add_bool(NUMA.name, self.numa);

        Ok(values)
    }
}

const MEMORY: PropertyDescriptor =
    PropertyDescriptor::uint("memory", 16, u64::MAX).with_default(Literal::UInt(512));
const SHARES: PropertyDescriptor =
    PropertyDescriptor::uint("shares", 0, 50_000).with_default(Literal::UInt(1000));

const MEMORY_DESCRIPTORS: &[PropertyDescriptor] = &[MEMORY, SHARES];

/// Memory allocation of a VM, in MiB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QemuMemoryProperties {
    pub memory: u64,
    /// Relative weight for auto-ballooning
    pub shares: u32,
}

impl Default for QemuMemoryProperties {
    fn default() -> Self {
        Self {
            memory: 512,
            shares: 1000,
        }
    }
}

impl PropertyCodec for QemuMemoryProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(MEMORY_DESCRIPTORS)
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            memory: MEMORY.decode_uint(bag)?,
            shares: SHARES.decode_uint(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();

        let memory = if self.memory == 0 { 512 } else { self.memory };
        values.add_uint(MEMORY.name, MEMORY.check_uint(memory)?);
        values.add_uint(SHARES.name, SHARES.check_uint(self.shares.into())?);

        Ok(values)
    }
}

/// Full typed configuration of a VM
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QemuConfig {
    pub general: VmProperties,
    pub cpu: QemuCpuProperties,
    pub memory: QemuMemoryProperties,
}

impl PropertyCodec for QemuConfig {
    fn known_keys() -> Vec<&'static str> {
        let mut keys = VmProperties::known_keys(Kind::Qemu);
        keys.extend(QemuCpuProperties::known_keys());
        keys.extend(QemuMemoryProperties::known_keys());
        keys
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            general: VmProperties::decode(Kind::Qemu, bag)?,
            cpu: QemuCpuProperties::decode(bag)?,
            memory: QemuMemoryProperties::decode(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = self.general.encode(Kind::Qemu)?;
        values.extend(self.cpu.encode()?);
        values.extend(self.memory.encode()?);
        Ok(values)
    }
}
