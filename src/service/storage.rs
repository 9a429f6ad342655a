//! Storage service and entity
//!
//! The backend type is part of a storage's identity; the claimed key set
//! of its detail record is chosen from that type.

use super::entity::Hydration;
use super::{fetch_object, fetch_rows, segment};
use crate::api::{Method, RequestSender, RequestValues};
use crate::error::{Error, Result};
use crate::types::codec::Detail;
use crate::types::storage::{
    storage_identity_from_listing, StorageBackend, StorageCommonProperties, StorageConfig,
    StorageKind, STORAGE_ID, STORAGE_TYPE,
};
use crate::types::Properties;
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn storage_path(id: &str) -> String {
    format!("storage/{}", segment(id))
}

/// Storage service
#[derive(Clone)]
pub struct StorageService {
    sender: Arc<dyn RequestSender>,
}

impl StorageService {
    pub fn new(sender: Arc<dyn RequestSender>) -> Self {
        Self { sender }
    }

    async fn list_identities(&self, kind: Option<StorageKind>) -> Result<Vec<(String, StorageKind)>> {
        let mut values = RequestValues::new();
        if let Some(kind) = kind {
            values.add_string(STORAGE_TYPE.name, kind.as_str());
        }

        let rows = fetch_rows(self.sender.as_ref(), "storage", &values).await?;
        let mut identities = Vec::with_capacity(rows.len());
        for row in &rows {
            match storage_identity_from_listing(row)? {
                Some(identity) => identities.push(identity),
                None => debug!(
                    storage = ?row.get(STORAGE_ID.name),
                    kind = ?row.get(STORAGE_TYPE.name),
                    "skipping storage of unmodelled type"
                ),
            }
        }

        // the server filter is advisory on older releases
        Ok(identities
            .into_iter()
            .filter(|(_, k)| kind.map_or(true, |kind| *k == kind))
            .collect())
    }

    /// All storages as stubs
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Storage>> {
        let identities = self.list_identities(None).await?;
        debug!(count = identities.len(), "listed storages");
        Ok(identities
            .into_iter()
            .map(|(id, kind)| self.stub(id, kind))
            .collect())
    }

    /// Storages of one backend type as stubs
    #[instrument(skip(self))]
    pub async fn list_by_kind(&self, kind: StorageKind) -> Result<Vec<Storage>> {
        Ok(self
            .list_identities(Some(kind))
            .await?
            .into_iter()
            .map(|(id, kind)| self.stub(id, kind))
            .collect())
    }

    /// Locate a storage by id and return it fully loaded
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Storage> {
        let (id, kind) = self
            .list_identities(None)
            .await?
            .into_iter()
            .find(|(candidate, _)| candidate == id)
            .ok_or_else(|| Error::not_found("storage", id))?;

        let detail = self.fetch_detail(&id, kind).await?;
        Ok(Storage {
            svc: self.clone(),
            id,
            kind,
            detail: Hydration::Full(detail),
        })
    }

    /// Define a new storage; the returned entity is a stub
    #[instrument(skip(self, config), fields(kind = %config.kind()))]
    pub async fn create(&self, id: &str, config: &StorageConfig) -> Result<Storage> {
        let mut values = RequestValues::new();
        values.add_string(STORAGE_ID.name, id);
        values.add_string(STORAGE_TYPE.name, config.kind().as_str());
        values.extend(config.encode()?);

        self.sender.send(Method::Post, "storage", &values).await?;
        info!(storage = id, "storage created");
        Ok(self.stub(id, config.kind()))
    }

    /// Fetch and decode the detail record of a storage declared as `kind`
    pub async fn fetch_detail(&self, id: &str, kind: StorageKind) -> Result<Detail<StorageConfig>> {
        let bag = fetch_object(self.sender.as_ref(), &storage_path(id)).await?;

        let actual: StorageKind = STORAGE_TYPE.decode_enum(&bag)?;
        assert_eq!(
            actual, kind,
            "storage {id} declared as {kind} resolved to a {actual} record"
        );

        Detail::decode_with(bag, &StorageConfig::known_keys(kind), |bag| {
            StorageConfig::decode(kind, bag)
        })
    }

    pub fn stub(&self, id: impl Into<String>, kind: StorageKind) -> Storage {
        Storage {
            svc: self.clone(),
            id: id.into(),
            kind,
            detail: Hydration::Stub,
        }
    }
}

/// A storage definition
pub struct Storage {
    svc: StorageService,
    id: String,
    kind: StorageKind,
    detail: Hydration<Detail<StorageConfig>>,
}

impl Storage {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn is_full(&self) -> bool {
        self.detail.is_full()
    }

    pub async fn load(&mut self) -> Result<()> {
        self.detail().await.map(|_| ())
    }

    async fn detail(&mut self) -> Result<&mut Detail<StorageConfig>> {
        let svc = &self.svc;
        let id = self.id.as_str();
        let kind = self.kind;
        self.detail
            .get_or_try_load(|| svc.fetch_detail(id, kind))
            .await
    }

    pub async fn config(&mut self) -> Result<&StorageConfig> {
        Ok(&self.detail().await?.properties)
    }

    pub async fn common(&mut self) -> Result<&StorageCommonProperties> {
        Ok(&self.config().await?.common)
    }

    pub async fn backend(&mut self) -> Result<&StorageBackend> {
        Ok(&self.config().await?.backend)
    }

    pub async fn extras(&mut self) -> Result<&Properties> {
        Ok(&self.detail().await?.extras)
    }

    /// Submit a new configuration and cache it once accepted.
    ///
    /// The backend type and creation-only options (path, volume group,
    /// thin pool, NFS server and export) cannot change in place; a config
    /// that alters them is rejected before anything is sent.
    #[instrument(skip(self, config), fields(storage = %self.id, kind = %self.kind))]
    pub async fn set_properties(&mut self, config: StorageConfig) -> Result<()> {
        if config.kind() != self.kind {
            return Err(Error::invalid(STORAGE_TYPE.name, config.kind().as_str()));
        }
        let values = config.encode_update()?;

        let current = &self.detail().await?.properties.backend;
        if let Some((name, value)) = current.changed_fixed_option(&config.backend) {
            return Err(Error::invalid(name, value));
        }

        self.svc
            .sender
            .send(Method::Put, &storage_path(&self.id), &values)
            .await?;
        info!(keys = values.len(), "storage configuration updated");

        if let Some(detail) = self.detail.get_mut() {
            detail.properties = config;
        }
        Ok(())
    }
}
