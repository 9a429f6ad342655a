//! Guest service and entities
//!
//! Guests are listed from `cluster/resources` as stubs and hydrate from
//! `nodes/{node}/{kind}/{vmid}/config` on first access to configuration.

use super::entity::Hydration;
use super::{fetch_object, fetch_rows, segment, task_id};
use crate::api::{Method, RequestSender, RequestValues};
use crate::error::{Error, Result};
use crate::types::codec::{Detail, PropertyCodec, PropertyDescriptor};
use crate::types::vm::{
    Kind, LxcConfig, LxcCpuProperties, LxcCreateOptions, LxcMemoryProperties, QemuConfig,
    QemuCpuProperties, QemuMemoryProperties, Status, VmIdentity, VmProperties,
};
use crate::types::Properties;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const NEXT_ID: PropertyDescriptor = PropertyDescriptor::uint("nextid", 100, 999_999_999);
const STATUS: PropertyDescriptor = PropertyDescriptor::enumeration("status", Status::ALL);

fn guest_path(identity: &VmIdentity) -> String {
    format!(
        "nodes/{}/{}/{}",
        segment(&identity.node),
        identity.kind,
        identity.vmid
    )
}

fn config_path(identity: &VmIdentity) -> String {
    format!("{}/config", guest_path(identity))
}

/// Detail record decoded for the kind it was fetched as
#[derive(Debug, Clone, PartialEq)]
pub enum VmDetail {
    Qemu(Detail<QemuConfig>),
    Lxc(Detail<LxcConfig>),
}

impl VmDetail {
    pub fn kind(&self) -> Kind {
        match self {
            VmDetail::Qemu(_) => Kind::Qemu,
            VmDetail::Lxc(_) => Kind::Lxc,
        }
    }
}

/// Guest service
#[derive(Clone)]
pub struct VmService {
    sender: Arc<dyn RequestSender>,
}

impl VmService {
    pub fn new(sender: Arc<dyn RequestSender>) -> Self {
        Self { sender }
    }

    async fn list_identities(&self) -> Result<Vec<VmIdentity>> {
        let mut values = RequestValues::new();
        values.add_string("type", "vm");

        let rows = fetch_rows(self.sender.as_ref(), "cluster/resources", &values).await?;
        let mut identities = rows
            .iter()
            .map(VmIdentity::from_listing)
            .collect::<Result<Vec<_>>>()?;

        identities.sort_by_key(|identity| identity.vmid);
        Ok(identities)
    }

    /// List all guests as stubs, ordered by vmid
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VirtualMachine>> {
        let identities = self.list_identities().await?;
        debug!(count = identities.len(), "listed guests");

        Ok(identities
            .into_iter()
            .map(|identity| self.stub(identity))
            .collect())
    }

    /// List guests of one kind as stubs, ordered by vmid
    #[instrument(skip(self))]
    pub async fn list_by_kind(&self, kind: Kind) -> Result<Vec<VirtualMachine>> {
        let identities = self.list_identities().await?;

        Ok(identities
            .into_iter()
            .filter(|identity| identity.kind == kind)
            .map(|identity| self.stub(identity))
            .collect())
    }

    /// Locate a guest by vmid without hydrating it
    pub async fn find(&self, vmid: u32) -> Result<VirtualMachine> {
        self.list_identities()
            .await?
            .into_iter()
            .find(|identity| identity.vmid == vmid)
            .map(|identity| self.stub(identity))
            .ok_or_else(|| Error::not_found("virtual machine", vmid))
    }

    /// Locate a guest by vmid and return it fully loaded
    #[instrument(skip(self))]
    pub async fn get(&self, vmid: u32) -> Result<VirtualMachine> {
        let mut vm = self.find(vmid).await?;
        vm.load().await?;
        Ok(vm)
    }

    /// Next free vmid in the cluster
    pub async fn next_vmid(&self) -> Result<u32> {
        let data = self
            .sender
            .send(Method::Get, "cluster/nextid", &RequestValues::new())
            .await?;

        let bag: Properties = [(NEXT_ID.name, data)].into_iter().collect();
        NEXT_ID.decode_uint(&bag)
    }

    /// Create a container; returns the task id of the creation job
    #[instrument(skip(self, options), fields(vmid = options.vmid, node = %options.node))]
    pub async fn create_lxc(&self, options: &LxcCreateOptions) -> Result<String> {
        let values = options.encode()?;
        let path = format!("nodes/{}/lxc", segment(&options.node));

        let upid = task_id(self.sender.send(Method::Post, &path, &values).await?)?;
        info!(%upid, "container creation started");
        Ok(upid)
    }

    /// Fetch and decode the detail record for `identity`
    pub async fn fetch_detail(&self, identity: &VmIdentity) -> Result<VmDetail> {
        let bag = fetch_object(self.sender.as_ref(), &config_path(identity)).await?;

        Ok(match identity.kind {
            Kind::Qemu => VmDetail::Qemu(Detail::decode(bag)?),
            Kind::Lxc => VmDetail::Lxc(Detail::decode(bag)?),
        })
    }

    /// Stub entity for a known identity
    pub fn stub(&self, identity: VmIdentity) -> VirtualMachine {
        match identity.kind {
            Kind::Qemu => VirtualMachine::Qemu(Guest::new(self.clone(), identity, Hydration::Stub)),
            Kind::Lxc => VirtualMachine::Lxc(Guest::new(self.clone(), identity, Hydration::Stub)),
        }
    }
}

/// Typed configuration of one guest kind
pub trait GuestConfig: PropertyCodec + Send + Sync + 'static {
    const KIND: Kind;

    /// Verb accepted by the kind's `config` endpoint for updates
    const UPDATE_METHOD: Method;

    fn general(&self) -> &VmProperties;

    /// Take the detail if it was decoded as this kind
    fn from_detail(detail: VmDetail) -> std::result::Result<Detail<Self>, VmDetail>;
}

impl GuestConfig for QemuConfig {
    const KIND: Kind = Kind::Qemu;
    const UPDATE_METHOD: Method = Method::Post;

    fn general(&self) -> &VmProperties {
        &self.general
    }

    fn from_detail(detail: VmDetail) -> std::result::Result<Detail<Self>, VmDetail> {
        match detail {
            VmDetail::Qemu(detail) => Ok(detail),
            other => Err(other),
        }
    }
}

impl GuestConfig for LxcConfig {
    const KIND: Kind = Kind::Lxc;
    const UPDATE_METHOD: Method = Method::Put;

    fn general(&self) -> &VmProperties {
        &self.general
    }

    fn from_detail(detail: VmDetail) -> std::result::Result<Detail<Self>, VmDetail> {
        match detail {
            VmDetail::Lxc(detail) => Ok(detail),
            other => Err(other),
        }
    }
}

/// A guest of kind `C::KIND`
pub struct Guest<C> {
    svc: VmService,
    identity: VmIdentity,
    detail: Hydration<Detail<C>>,
}

pub type QemuVirtualMachine = Guest<QemuConfig>;
pub type LxcVirtualMachine = Guest<LxcConfig>;

impl<C: GuestConfig> Guest<C> {
    fn new(svc: VmService, identity: VmIdentity, detail: Hydration<Detail<C>>) -> Self {
        assert_eq!(identity.kind, C::KIND, "guest identity does not match its config kind");
        Self {
            svc,
            identity,
            detail,
        }
    }

    pub fn identity(&self) -> &VmIdentity {
        &self.identity
    }

    pub fn vmid(&self) -> u32 {
        self.identity.vmid
    }

    pub fn node(&self) -> &str {
        &self.identity.node
    }

    pub fn kind(&self) -> Kind {
        C::KIND
    }

    pub fn is_template(&self) -> bool {
        self.identity.template
    }

    pub fn is_full(&self) -> bool {
        self.detail.is_full()
    }

    /// Hydrate from the detail record; no-op when already full
    pub async fn load(&mut self) -> Result<()> {
        self.detail().await.map(|_| ())
    }

    async fn detail(&mut self) -> Result<&mut Detail<C>> {
        let svc = &self.svc;
        let identity = &self.identity;

        self.detail
            .get_or_try_load(|| async move {
                debug!(vmid = identity.vmid, kind = %C::KIND, "hydrating guest");
                svc.fetch_detail(identity)
                    .await
                    .map(|resolved| match C::from_detail(resolved) {
                        Ok(detail) => detail,
                        Err(other) => panic!(
                            "guest {} declared as {} resolved to a {} record",
                            identity.vmid,
                            C::KIND,
                            other.kind()
                        ),
                    })
            })
            .await
    }

    pub async fn config(&mut self) -> Result<&C> {
        Ok(&self.detail().await?.properties)
    }

    /// Wire fields not covered by the typed configuration
    pub async fn extras(&mut self) -> Result<&Properties> {
        Ok(&self.detail().await?.extras)
    }

    pub async fn name(&mut self) -> Result<&str> {
        Ok(self.config().await?.general().name.as_str())
    }

    pub async fn description(&mut self) -> Result<&str> {
        Ok(self.config().await?.general().description.as_str())
    }

    /// Submit `config` and cache it once the server accepts it
    #[instrument(skip(self, config), fields(vmid = self.identity.vmid, kind = %C::KIND))]
    pub async fn set_properties(&mut self, config: C) -> Result<()> {
        let values = config.encode()?;
        self.load().await?;

        self.svc
            .sender
            .send(C::UPDATE_METHOD, &config_path(&self.identity), &values)
            .await?;
        info!(keys = values.len(), "guest configuration updated");

        if let Some(detail) = self.detail.get_mut() {
            detail.properties = config;
        }
        Ok(())
    }

    /// Current runtime status
    pub async fn status(&self) -> Result<Status> {
        let path = format!("{}/status/current", guest_path(&self.identity));
        let bag = fetch_object(self.svc.sender.as_ref(), &path).await?;
        STATUS.decode_enum(&bag)
    }

    /// Destroy the guest; returns the task id
    #[instrument(skip(self), fields(vmid = self.identity.vmid))]
    pub async fn delete(self, purge: bool) -> Result<String> {
        let mut values = RequestValues::new();
        if purge {
            values.add_bool("purge", true);
        }

        let data = self
            .svc
            .sender
            .send(Method::Delete, &guest_path(&self.identity), &values)
            .await?;
        let upid = task_id(data)?;
        info!(%upid, "guest deletion started");
        Ok(upid)
    }
}

impl Guest<LxcConfig> {
    pub async fn cpu(&mut self) -> Result<LxcCpuProperties> {
        Ok(self.config().await?.cpu)
    }

    pub async fn memory(&mut self) -> Result<LxcMemoryProperties> {
        Ok(self.config().await?.memory)
    }

    pub async fn set_cpu(&mut self, cpu: LxcCpuProperties) -> Result<()> {
        let config = LxcConfig {
            cpu,
            ..self.config().await?.clone()
        };
        self.set_properties(config).await
    }

    pub async fn set_memory(&mut self, memory: LxcMemoryProperties) -> Result<()> {
        let config = LxcConfig {
            memory,
            ..self.config().await?.clone()
        };
        self.set_properties(config).await
    }
}

impl Guest<QemuConfig> {
    pub async fn cpu(&mut self) -> Result<QemuCpuProperties> {
        Ok(self.config().await?.cpu)
    }

    pub async fn memory(&mut self) -> Result<QemuMemoryProperties> {
        Ok(self.config().await?.memory)
    }

    pub async fn set_cpu(&mut self, cpu: QemuCpuProperties) -> Result<()> {
        let config = QemuConfig {
            cpu,
            ..self.config().await?.clone()
        };
        self.set_properties(config).await
    }

    pub async fn set_memory(&mut self, memory: QemuMemoryProperties) -> Result<()> {
        let config = QemuConfig {
            memory,
            ..self.config().await?.clone()
        };
        self.set_properties(config).await
    }
}

/// A guest of either kind
pub enum VirtualMachine {
    Qemu(QemuVirtualMachine),
    Lxc(LxcVirtualMachine),
}

impl VirtualMachine {
    pub fn identity(&self) -> &VmIdentity {
        match self {
            VirtualMachine::Qemu(vm) => vm.identity(),
            VirtualMachine::Lxc(vm) => vm.identity(),
        }
    }

    pub fn vmid(&self) -> u32 {
        self.identity().vmid
    }

    pub fn node(&self) -> &str {
        &self.identity().node
    }

    pub fn kind(&self) -> Kind {
        self.identity().kind
    }

    pub fn is_template(&self) -> bool {
        self.identity().template
    }

    pub fn is_full(&self) -> bool {
        match self {
            VirtualMachine::Qemu(vm) => vm.is_full(),
            VirtualMachine::Lxc(vm) => vm.is_full(),
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        match self {
            VirtualMachine::Qemu(vm) => vm.load().await,
            VirtualMachine::Lxc(vm) => vm.load().await,
        }
    }

    pub async fn general(&mut self) -> Result<&VmProperties> {
        match self {
            VirtualMachine::Qemu(vm) => Ok(vm.config().await?.general()),
            VirtualMachine::Lxc(vm) => Ok(vm.config().await?.general()),
        }
    }

    pub async fn name(&mut self) -> Result<&str> {
        Ok(self.general().await?.name.as_str())
    }

    pub async fn extras(&mut self) -> Result<&Properties> {
        match self {
            VirtualMachine::Qemu(vm) => vm.extras().await,
            VirtualMachine::Lxc(vm) => vm.extras().await,
        }
    }

    pub async fn status(&self) -> Result<Status> {
        match self {
            VirtualMachine::Qemu(vm) => vm.status().await,
            VirtualMachine::Lxc(vm) => vm.status().await,
        }
    }

    pub async fn delete(self, purge: bool) -> Result<String> {
        match self {
            VirtualMachine::Qemu(vm) => vm.delete(purge).await,
            VirtualMachine::Lxc(vm) => vm.delete(purge).await,
        }
    }

    pub fn as_qemu_mut(&mut self) -> Option<&mut QemuVirtualMachine> {
        match self {
            VirtualMachine::Qemu(vm) => Some(vm),
            VirtualMachine::Lxc(_) => None,
        }
    }

    pub fn as_lxc_mut(&mut self) -> Option<&mut LxcVirtualMachine> {
        match self {
            VirtualMachine::Lxc(vm) => Some(vm),
            VirtualMachine::Qemu(_) => None,
        }
    }

    pub fn into_lxc(self) -> Option<LxcVirtualMachine> {
        match self {
            VirtualMachine::Lxc(vm) => Some(vm),
            VirtualMachine::Qemu(_) => None,
        }
    }

    pub fn into_qemu(self) -> Option<QemuVirtualMachine> {
        match self {
            VirtualMachine::Qemu(vm) => Some(vm),
            VirtualMachine::Lxc(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockSender;
    use serde_json::json;

    const LXC_CONFIG: &str = "nodes/pve1/lxc/101/config";

    fn mock_cluster() -> Arc<MockSender> {
        let mock = Arc::new(MockSender::new());
        mock.respond(
            Method::Get,
            "cluster/resources",
            json!([
                {"id": "lxc/101", "vmid": 101, "type": "lxc", "node": "pve1", "template": 0},
                {"id": "qemu/100", "vmid": 100, "type": "qemu", "node": "pve2", "template": 1}
            ]),
        );
        mock.respond(
            Method::Get,
            LXC_CONFIG,
            json!({
                "hostname": "ct101",
                "description": "build runner",
                "cores": 2,
                "memory": 4096,
                "swap": 2048,
                "net0": "name=eth0,bridge=vmbr0,ip=dhcp",
                "digest": "9c1e"
            }),
        );
        mock
    }

    fn service(mock: &Arc<MockSender>) -> VmService {
        VmService::new(mock.clone())
    }

    #[tokio::test]
    async fn test_list_returns_sorted_stubs() {
        let mock = mock_cluster();
        let vms = service(&mock).list().await.unwrap();

        assert_eq!(vms.iter().map(|vm| vm.vmid()).collect::<Vec<_>>(), vec![100, 101]);
        assert!(vms.iter().all(|vm| !vm.is_full()));
        assert!(vms[0].is_template());
        assert_eq!(vms[1].node(), "pve1");

        let call = mock.last_call(Method::Get, "cluster/resources").unwrap();
        assert_eq!(call.values.get("type"), Some("vm"));
    }

    #[tokio::test]
    async fn test_list_by_kind() {
        let mock = mock_cluster();
        let vms = service(&mock).list_by_kind(Kind::Lxc).await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0].kind(), Kind::Lxc);
    }

    #[tokio::test]
    async fn test_stub_hydrates_exactly_once() {
        let mock = mock_cluster();
        let vms = service(&mock).list_by_kind(Kind::Lxc).await.unwrap();
        let mut ct = vms.into_iter().next().unwrap().into_lxc().unwrap();

        assert_eq!(mock.count(Method::Get, LXC_CONFIG), 0);

        let memory = ct.memory().await.unwrap();
        assert_eq!(memory, LxcMemoryProperties { memory: 4096, swap: 2048 });
        assert_eq!(mock.count(Method::Get, LXC_CONFIG), 1);

        assert_eq!(ct.cpu().await.unwrap().cores, 2);
        assert_eq!(ct.description().await.unwrap(), "build runner");
        assert_eq!(mock.count(Method::Get, LXC_CONFIG), 1);
        assert!(ct.is_full());
        assert_eq!(ct.vmid(), 101);
        assert_eq!(ct.node(), "pve1");
    }

    #[tokio::test]
    async fn test_extras_are_preserved() {
        let mock = mock_cluster();
        let mut vm = service(&mock).get(101).await.unwrap();

        let extras = vm.extras().await.unwrap();
        let mut keys: Vec<&str> = extras.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["digest", "net0"]);
        assert_eq!(extras.get("net0"), Some(&json!("name=eth0,bridge=vmbr0,ip=dhcp")));
    }

    #[tokio::test]
    async fn test_get_unknown_vmid_is_not_found() {
        let mock = mock_cluster();
        let err = service(&mock).get(999).await.err().unwrap();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failed_hydration_leaves_stub() {
        let mock = mock_cluster();
        mock.respond(Method::Get, LXC_CONFIG, json!({"memory": 512, "swap": 0}));

        let mut ct = service(&mock)
            .stub(VmIdentity::new(101, Kind::Lxc, "pve1"))
            .into_lxc()
            .unwrap();

        let err = ct.cpu().await.unwrap_err();
        assert!(matches!(err, Error::MissingProperty { ref name } if name == "cores"));
        assert!(!ct.is_full());
    }

    #[tokio::test]
    async fn test_set_memory_updates_cache_on_success() {
        let mock = mock_cluster();
        mock.respond(Method::Put, LXC_CONFIG, json!(null));

        let mut ct = service(&mock).get(101).await.unwrap().into_lxc().unwrap();
        ct.set_memory(LxcMemoryProperties { memory: 8192, swap: 0 })
            .await
            .unwrap();

        assert_eq!(ct.memory().await.unwrap().memory, 8192);
        let call = mock.last_call(Method::Put, LXC_CONFIG).unwrap();
        assert_eq!(call.values.get("memory"), Some("8192"));
        assert_eq!(call.values.get("cores"), Some("2"));
        assert_eq!(mock.count(Method::Get, LXC_CONFIG), 1);
    }

    #[tokio::test]
    async fn test_set_memory_keeps_cache_on_transport_failure() {
        let mock = mock_cluster();
        mock.fail(Method::Put, LXC_CONFIG, "API request failed: 500 Internal Server Error");

        let mut ct = service(&mock).get(101).await.unwrap().into_lxc().unwrap();
        let err = ct
            .set_memory(LxcMemoryProperties { memory: 8192, swap: 0 })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(
            ct.memory().await.unwrap(),
            LxcMemoryProperties { memory: 4096, swap: 2048 }
        );
    }

    #[tokio::test]
    async fn test_invalid_update_sends_nothing() {
        let mock = mock_cluster();
        let mut ct = service(&mock).get(101).await.unwrap().into_lxc().unwrap();

        let err = ct
            .set_cpu(LxcCpuProperties { cores: 500, limit: 0, units: 1024 })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidProperty { ref name, .. } if name == "cores"));
        assert!(mock.calls().iter().all(|c| c.method == Method::Get));
        assert_eq!(ct.cpu().await.unwrap().cores, 2);
    }

    #[tokio::test]
    async fn test_status() {
        let mock = mock_cluster();
        mock.respond(
            Method::Get,
            "nodes/pve2/qemu/100/status/current",
            json!({"status": "running", "qmpstatus": "running", "uptime": 3600}),
        );

        let vm = service(&mock).stub(VmIdentity::new(100, Kind::Qemu, "pve2"));
        assert_eq!(vm.status().await.unwrap(), Status::Running);
        assert!(!vm.is_full());
    }

    #[tokio::test]
    async fn test_next_vmid_accepts_string() {
        let mock = mock_cluster();
        mock.respond(Method::Get, "cluster/nextid", json!("102"));
        assert_eq!(service(&mock).next_vmid().await.unwrap(), 102);
    }

    #[tokio::test]
    async fn test_delete_with_purge() {
        let mock = mock_cluster();
        mock.respond(Method::Delete, "nodes/pve1/lxc/101", json!("UPID:pve1:1:2:3:vzdestroy:101:root@pam:"));

        let vm = service(&mock).stub(VmIdentity::new(101, Kind::Lxc, "pve1"));
        let upid = vm.delete(true).await.unwrap();
        assert!(upid.contains("vzdestroy"));

        let call = mock.last_call(Method::Delete, "nodes/pve1/lxc/101").unwrap();
        assert_eq!(call.values.get("purge"), Some("1"));
    }

    #[tokio::test]
    async fn test_update_verb_follows_guest_kind() {
        let mock = mock_cluster();
        let qemu_config = "nodes/pve2/qemu/100/config";
        mock.respond(Method::Get, qemu_config, json!({"cores": 2, "sockets": 1}));
        mock.respond(Method::Post, qemu_config, json!(null));
        mock.respond(Method::Put, LXC_CONFIG, json!(null));

        let svc = service(&mock);
        let mut vm = svc.get(100).await.unwrap().into_qemu().unwrap();
        let cpu = QemuCpuProperties { cores: 4, ..vm.cpu().await.unwrap() };
        vm.set_cpu(cpu).await.unwrap();
        assert_eq!(mock.count(Method::Post, qemu_config), 1);
        assert_eq!(mock.count(Method::Put, qemu_config), 0);

        let mut ct = svc.get(101).await.unwrap().into_lxc().unwrap();
        ct.set_cpu(LxcCpuProperties { cores: 3, limit: 0, units: 1024 })
            .await
            .unwrap();
        assert_eq!(mock.count(Method::Put, LXC_CONFIG), 1);
        assert_eq!(mock.count(Method::Post, LXC_CONFIG), 0);
    }

    #[tokio::test]
    async fn test_create_lxc_posts_to_node() {
        let mock = mock_cluster();
        mock.respond(Method::Post, "nodes/pve1/lxc", json!("UPID:pve1:1:2:3:vzcreate:105:root@pam:"));

        let options = LxcCreateOptions {
            vmid: 105,
            node: "pve1".to_string(),
            ostemplate_storage: "local".to_string(),
            ostemplate: "debian-12-standard_12.7-1_amd64.tar.zst".to_string(),
            rootfs_storage: "local-lvm".to_string(),
            rootfs_size: 8,
            config: LxcConfig::default(),
        };
        let upid = service(&mock).create_lxc(&options).await.unwrap();
        assert!(upid.contains("vzcreate"));

        let call = mock.last_call(Method::Post, "nodes/pve1/lxc").unwrap();
        assert_eq!(call.values.get("vmid"), Some("105"));
        assert_eq!(
            call.values.get("ostemplate"),
            Some("local:vztmpl/debian-12-standard_12.7-1_amd64.tar.zst")
        );
        assert_eq!(call.values.get("rootfs"), Some("local-lvm:8"));
        assert_eq!(call.values.get("memory"), Some("512"));
    }

    #[tokio::test]
    async fn test_unknown_status_is_invalid() {
        let mock = mock_cluster();
        mock.respond(Method::Get, "nodes/pve1/lxc/101/status/current", json!({"status": "migrating"}));

        let vm = service(&mock).stub(VmIdentity::new(101, Kind::Lxc, "pve1"));
        let err = vm.status().await.unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { ref name, .. } if name == "status"));
    }

    #[tokio::test]
    #[should_panic(expected = "resolved to a")]
    async fn test_kind_mismatch_fails_fast() {
        let mock = mock_cluster();
        let svc = service(&mock);
        let mut guest: LxcVirtualMachine = Guest {
            svc: svc.clone(),
            identity: VmIdentity::new(100, Kind::Qemu, "pve2"),
            detail: Hydration::Stub,
        };
        mock.respond(Method::Get, "nodes/pve2/qemu/100/config", json!({"cores": 1}));

        let _ = guest.load().await;
    }
}
