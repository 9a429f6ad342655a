//! Storage backend types
//!
//! Storage records share a set of common options; the remaining keys depend
//! on the backend `type`, so the claimed key set is selected per
//! [`StorageKind`].

use super::codec::{keys_of, Literal, PropertyCodec, PropertyDescriptor};
use super::properties::Properties;
use crate::api::RequestValues;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Dir,
    Lvm,
    LvmThin,
    Nfs,
}

impl StorageKind {
    pub const ALL: &'static [&'static str] = &["dir", "lvm", "lvmthin", "nfs"];

    /// Whether the backend accepts the `shared` flag
    pub fn accepts_shared(self) -> bool {
        matches!(self, StorageKind::Dir | StorageKind::Lvm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Dir => "dir",
            StorageKind::Lvm => "lvm",
            StorageKind::LvmThin => "lvmthin",
            StorageKind::Nfs => "nfs",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dir" => Ok(StorageKind::Dir),
            "lvm" => Ok(StorageKind::Lvm),
            "lvmthin" => Ok(StorageKind::LvmThin),
            "nfs" => Ok(StorageKind::Nfs),
            other => Err(Error::invalid("type", other)),
        }
    }
}

pub(crate) const STORAGE_ID: PropertyDescriptor = PropertyDescriptor::string("storage");
pub(crate) const STORAGE_TYPE: PropertyDescriptor =
    PropertyDescriptor::enumeration("type", StorageKind::ALL);

/// Identity of a storage from the `storage` listing.
///
/// Rows whose `type` names a backend without a typed model (zfspool, rbd,
/// cifs, ...) yield `None`.
pub fn storage_identity_from_listing(bag: &Properties) -> Result<Option<(String, StorageKind)>> {
    let id = STORAGE_ID.decode_string(bag)?;
    match bag.get(STORAGE_TYPE.name) {
        Some(Value::String(kind)) if !StorageKind::ALL.contains(&kind.as_str()) => Ok(None),
        _ => Ok(Some((id, STORAGE_TYPE.decode_enum(bag)?))),
    }
}

/// Name and new value of the first option that differs
fn first_change(options: &[(&'static str, &String, &String)]) -> Option<(&'static str, String)> {
    options
        .iter()
        .find(|(_, current, next)| current != next)
        .map(|(name, _, next)| (*name, next.to_string()))
}

fn add_nonempty(values: &mut RequestValues, key: &str, value: &str) {
    if !value.is_empty() {
        values.add_string(key, value);
    }
}

const CONTENT: PropertyDescriptor =
    PropertyDescriptor::string("content").with_default(Literal::Str(""));
const NODES: PropertyDescriptor =
    PropertyDescriptor::string("nodes").with_default(Literal::Str(""));
const SHARED: PropertyDescriptor =
    PropertyDescriptor::boolean("shared").with_default(Literal::Bool(false));
const DISABLE: PropertyDescriptor =
    PropertyDescriptor::boolean("disable").with_default(Literal::Bool(false));

const COMMON_DESCRIPTORS: &[PropertyDescriptor] = &[CONTENT, NODES, SHARED, DISABLE];

/// Options every storage type understands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageCommonProperties {
    /// Comma separated content types, e.g. `images,rootdir`
    pub content: String,
    /// Comma separated node restriction; empty means all nodes
    pub nodes: String,
    pub shared: bool,
    pub disable: bool,
}

impl PropertyCodec for StorageCommonProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(COMMON_DESCRIPTORS)
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            content: CONTENT.decode_string(bag)?,
            nodes: NODES.decode_string(bag)?,
            shared: SHARED.decode_bool(bag)?,
            disable: DISABLE.decode_bool(bag)?,
        })
    }

    /// `shared` is left to [`StorageConfig`], which knows the backend type
    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();
        add_nonempty(&mut values, CONTENT.name, &self.content);
        add_nonempty(&mut values, NODES.name, &self.nodes);
        values.add_bool(DISABLE.name, self.disable);
        Ok(values)
    }
}

const DIR_PATH: PropertyDescriptor = PropertyDescriptor::string("path");
const MKDIR: PropertyDescriptor =
    PropertyDescriptor::boolean("mkdir").with_default(Literal::Bool(true));

/// Directory storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirStorageProperties {
    pub path: String,
    pub mkdir: bool,
}

impl PropertyCodec for DirStorageProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(&[DIR_PATH, MKDIR])
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            path: DIR_PATH.decode_string(bag)?,
            mkdir: MKDIR.decode_bool(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        if self.path.is_empty() {
            return Err(Error::invalid(DIR_PATH.name, ""));
        }
        let mut values = RequestValues::new();
        values.add_string(DIR_PATH.name, self.path.as_str());
        values.add_bool(MKDIR.name, self.mkdir);
        Ok(values)
    }
}

impl DirStorageProperties {
    fn encode_update(&self) -> RequestValues {
        let mut values = RequestValues::new();
        values.add_bool(MKDIR.name, self.mkdir);
        values
    }

    fn changed_fixed_option(&self, other: &Self) -> Option<(&'static str, String)> {
        first_change(&[(DIR_PATH.name, &self.path, &other.path)])
    }
}

const VGNAME: PropertyDescriptor = PropertyDescriptor::string("vgname");
const BASE: PropertyDescriptor = PropertyDescriptor::string("base").with_default(Literal::Str(""));
const SAFE_REMOVE: PropertyDescriptor =
    PropertyDescriptor::boolean("saferemove").with_default(Literal::Bool(false));

/// Thick LVM storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LvmStorageProperties {
    pub volume_group: String,
    /// Base volume, e.g. an iSCSI LUN
    pub base: String,
    pub safe_remove: bool,
}

impl PropertyCodec for LvmStorageProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(&[VGNAME, BASE, SAFE_REMOVE])
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            volume_group: VGNAME.decode_string(bag)?,
            base: BASE.decode_string(bag)?,
            safe_remove: SAFE_REMOVE.decode_bool(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        if self.volume_group.is_empty() {
            return Err(Error::invalid(VGNAME.name, ""));
        }
        let mut values = RequestValues::new();
        values.add_string(VGNAME.name, self.volume_group.as_str());
        add_nonempty(&mut values, BASE.name, &self.base);
        values.add_bool(SAFE_REMOVE.name, self.safe_remove);
        Ok(values)
    }
}

impl LvmStorageProperties {
    fn encode_update(&self) -> RequestValues {
        let mut values = RequestValues::new();
        values.add_bool(SAFE_REMOVE.name, self.safe_remove);
        values
    }

    fn changed_fixed_option(&self, other: &Self) -> Option<(&'static str, String)> {
        first_change(&[
            (VGNAME.name, &self.volume_group, &other.volume_group),
            (BASE.name, &self.base, &other.base),
        ])
    }
}

const THINPOOL: PropertyDescriptor = PropertyDescriptor::string("thinpool");

/// LVM thin-pool storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LvmThinStorageProperties {
    pub volume_group: String,
    pub thin_pool: String,
}

impl PropertyCodec for LvmThinStorageProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(&[VGNAME, THINPOOL])
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            volume_group: VGNAME.decode_string(bag)?,
            thin_pool: THINPOOL.decode_string(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        if self.volume_group.is_empty() {
            return Err(Error::invalid(VGNAME.name, ""));
        }
        if self.thin_pool.is_empty() {
            return Err(Error::invalid(THINPOOL.name, ""));
        }
        let mut values = RequestValues::new();
        values.add_string(VGNAME.name, self.volume_group.as_str());
        values.add_string(THINPOOL.name, self.thin_pool.as_str());
        Ok(values)
    }
}

impl LvmThinStorageProperties {
    fn changed_fixed_option(&self, other: &Self) -> Option<(&'static str, String)> {
        first_change(&[
            (VGNAME.name, &self.volume_group, &other.volume_group),
            (THINPOOL.name, &self.thin_pool, &other.thin_pool),
        ])
    }
}

const SERVER: PropertyDescriptor = PropertyDescriptor::string("server");
const EXPORT: PropertyDescriptor = PropertyDescriptor::string("export");
const MOUNT_PATH: PropertyDescriptor = PropertyDescriptor::string("path");
const OPTIONS: PropertyDescriptor =
    PropertyDescriptor::string("options").with_default(Literal::Str(""));

/// NFS share storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NfsStorageProperties {
    pub server: String,
    pub export: String,
    /// Local mount point
    pub path: String,
    /// Extra mount options, e.g. `vers=4.2`
    pub options: String,
}

impl PropertyCodec for NfsStorageProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(&[SERVER, EXPORT, MOUNT_PATH, OPTIONS])
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            server: SERVER.decode_string(bag)?,
            export: EXPORT.decode_string(bag)?,
            path: MOUNT_PATH.decode_string(bag)?,
            options: OPTIONS.decode_string(bag)?,
        })
    }

    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();
        for (descriptor, value) in [
            (SERVER, &self.server),
            (EXPORT, &self.export),
            (MOUNT_PATH, &self.path),
        ] {
            if value.is_empty() {
                return Err(Error::invalid(descriptor.name, ""));
            }
            values.add_string(descriptor.name, value.as_str());
        }
        add_nonempty(&mut values, OPTIONS.name, &self.options);
        Ok(values)
    }
}

impl NfsStorageProperties {
    fn encode_update(&self) -> RequestValues {
        let mut values = RequestValues::new();
        add_nonempty(&mut values, OPTIONS.name, &self.options);
        values
    }

    fn changed_fixed_option(&self, other: &Self) -> Option<(&'static str, String)> {
        first_change(&[
            (SERVER.name, &self.server, &other.server),
            (EXPORT.name, &self.export, &other.export),
            (MOUNT_PATH.name, &self.path, &other.path),
        ])
    }
}

/// Backend-specific properties, one variant per [`StorageKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    Dir(DirStorageProperties),
    Lvm(LvmStorageProperties),
    LvmThin(LvmThinStorageProperties),
    Nfs(NfsStorageProperties),
}

impl StorageBackend {
    pub fn kind(&self) -> StorageKind {
        match self {
            StorageBackend::Dir(_) => StorageKind::Dir,
            StorageBackend::Lvm(_) => StorageKind::Lvm,
            StorageBackend::LvmThin(_) => StorageKind::LvmThin,
            StorageBackend::Nfs(_) => StorageKind::Nfs,
        }
    }

    pub fn known_keys(kind: StorageKind) -> Vec<&'static str> {
        match kind {
            StorageKind::Dir => DirStorageProperties::known_keys(),
            StorageKind::Lvm => LvmStorageProperties::known_keys(),
            StorageKind::LvmThin => LvmThinStorageProperties::known_keys(),
            StorageKind::Nfs => NfsStorageProperties::known_keys(),
        }
    }

    pub fn decode(kind: StorageKind, bag: &Properties) -> Result<Self> {
        Ok(match kind {
            StorageKind::Dir => StorageBackend::Dir(DirStorageProperties::decode(bag)?),
            StorageKind::Lvm => StorageBackend::Lvm(LvmStorageProperties::decode(bag)?),
            StorageKind::LvmThin => StorageBackend::LvmThin(LvmThinStorageProperties::decode(bag)?),
            StorageKind::Nfs => StorageBackend::Nfs(NfsStorageProperties::decode(bag)?),
        })
    }

    /// Creation body: every option, creation-only ones included
    pub fn encode(&self) -> Result<RequestValues> {
        match self {
            StorageBackend::Dir(p) => p.encode(),
            StorageBackend::Lvm(p) => p.encode(),
            StorageBackend::LvmThin(p) => p.encode(),
            StorageBackend::Nfs(p) => p.encode(),
        }
    }

    /// Update body: only the options the server lets change in place
    pub fn encode_update(&self) -> RequestValues {
        match self {
            StorageBackend::Dir(p) => p.encode_update(),
            StorageBackend::Lvm(p) => p.encode_update(),
            StorageBackend::LvmThin(_) => RequestValues::new(),
            StorageBackend::Nfs(p) => p.encode_update(),
        }
    }

    /// First creation-only option whose value differs in `next`, with that new value
    pub fn changed_fixed_option(&self, next: &StorageBackend) -> Option<(&'static str, String)> {
        match (self, next) {
            (StorageBackend::Dir(a), StorageBackend::Dir(b)) => a.changed_fixed_option(b),
            (StorageBackend::Lvm(a), StorageBackend::Lvm(b)) => a.changed_fixed_option(b),
            (StorageBackend::LvmThin(a), StorageBackend::LvmThin(b)) => a.changed_fixed_option(b),
            (StorageBackend::Nfs(a), StorageBackend::Nfs(b)) => a.changed_fixed_option(b),
            _ => Some((STORAGE_TYPE.name, next.kind().as_str().to_string())),
        }
    }
}

/// Full typed configuration of a storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageConfig {
    pub common: StorageCommonProperties,
    pub backend: StorageBackend,
}

impl StorageConfig {
    /// Keys claimed for `kind`, identity keys included
    pub fn known_keys(kind: StorageKind) -> Vec<&'static str> {
        let mut keys = vec![STORAGE_ID.name, STORAGE_TYPE.name];
        keys.extend(StorageCommonProperties::known_keys());
        keys.extend(StorageBackend::known_keys(kind));
        keys
    }

    pub fn decode(kind: StorageKind, bag: &Properties) -> Result<Self> {
        Ok(Self {
            common: StorageCommonProperties::decode(bag)?,
            backend: StorageBackend::decode(kind, bag)?,
        })
    }

    pub fn kind(&self) -> StorageKind {
        self.backend.kind()
    }

    fn add_shared(&self, values: &mut RequestValues) {
        if self.kind().accepts_shared() {
            values.add_bool(SHARED.name, self.common.shared);
        }
    }

    /// Creation body without the identity keys, which the caller adds
    pub fn encode(&self) -> Result<RequestValues> {
        let mut values = self.common.encode()?;
        self.add_shared(&mut values);
        values.extend(self.backend.encode()?);
        Ok(values)
    }

    /// Update body for `PUT storage/{id}`; creation-only options are left out
    pub fn encode_update(&self) -> Result<RequestValues> {
        let mut values = self.common.encode()?;
        self.add_shared(&mut values);
        values.extend(self.backend.encode_update());
        Ok(values)
    }
}
