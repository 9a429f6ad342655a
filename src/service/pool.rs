//! Resource pool service and entity

use super::entity::Hydration;
use super::{fetch_object, fetch_rows, segment};
use crate::api::{Method, RequestSender, RequestValues};
use crate::error::{Error, Result};
use crate::types::codec::{Detail, PropertyCodec};
use crate::types::pool::{pool_id_from_listing, PoolConfig, PoolMember, PoolProperties};
use crate::types::Properties;
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn pool_path(name: &str) -> String {
    format!("pools/{}", segment(name))
}

/// Pool service
#[derive(Clone)]
pub struct PoolService {
    sender: Arc<dyn RequestSender>,
}

impl PoolService {
    pub fn new(sender: Arc<dyn RequestSender>) -> Self {
        Self { sender }
    }

    async fn list_names(&self) -> Result<Vec<String>> {
        let rows = fetch_rows(self.sender.as_ref(), "pools", &RequestValues::new()).await?;
        rows.iter().map(pool_id_from_listing).collect()
    }

    /// All pools as stubs, in listing order
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Pool>> {
        let names = self.list_names().await?;
        debug!(count = names.len(), "listed pools");
        Ok(names.into_iter().map(|name| self.stub(name)).collect())
    }

    /// Locate a pool by name and return it fully loaded
    #[instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<Pool> {
        if !self.list_names().await?.iter().any(|n| n == name) {
            return Err(Error::not_found("pool", name));
        }

        let detail = self.fetch_detail(name).await?;
        Ok(Pool {
            svc: self.clone(),
            name: name.to_string(),
            detail: Hydration::Full(detail),
        })
    }

    pub async fn fetch_detail(&self, name: &str) -> Result<Detail<PoolConfig>> {
        let bag = fetch_object(self.sender.as_ref(), &pool_path(name)).await?;
        Detail::decode(bag)
    }

    pub fn stub(&self, name: impl Into<String>) -> Pool {
        Pool {
            svc: self.clone(),
            name: name.into(),
            detail: Hydration::Stub,
        }
    }
}

/// A resource pool
pub struct Pool {
    svc: PoolService,
    name: String,
    detail: Hydration<Detail<PoolConfig>>,
}

impl Pool {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_full(&self) -> bool {
        self.detail.is_full()
    }

    pub async fn load(&mut self) -> Result<()> {
        self.detail().await.map(|_| ())
    }

    async fn detail(&mut self) -> Result<&mut Detail<PoolConfig>> {
        let svc = &self.svc;
        let name = self.name.as_str();
        self.detail
            .get_or_try_load(|| svc.fetch_detail(name))
            .await
    }

    pub async fn properties(&mut self) -> Result<&PoolProperties> {
        Ok(&self.detail().await?.properties.properties)
    }

    pub async fn description(&mut self) -> Result<&str> {
        Ok(self.properties().await?.description.as_str())
    }

    pub async fn members(&mut self) -> Result<&[PoolMember]> {
        Ok(self.detail().await?.properties.members.as_slice())
    }

    pub async fn extras(&mut self) -> Result<&Properties> {
        Ok(&self.detail().await?.extras)
    }

    /// Submit new properties and cache them once accepted
    #[instrument(skip(self, properties), fields(pool = %self.name))]
    pub async fn set_properties(&mut self, properties: PoolProperties) -> Result<()> {
        let values = properties.encode()?;
        self.load().await?;

        self.svc
            .sender
            .send(Method::Put, &pool_path(&self.name), &values)
            .await?;
        info!("pool properties updated");

        if let Some(detail) = self.detail.get_mut() {
            detail.properties.properties = properties;
        }
        Ok(())
    }

    pub async fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.set_properties(PoolProperties {
            description: description.into(),
        })
        .await
    }

    /// Remove the pool; the server refuses while it still has members
    #[instrument(skip(self), fields(pool = %self.name))]
    pub async fn delete(self) -> Result<()> {
        self.svc
            .sender
            .send(Method::Delete, &pool_path(&self.name), &RequestValues::new())
            .await?;
        info!("pool deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockSender;
    use serde_json::json;

    fn mock_pools() -> Arc<MockSender> {
        let mock = Arc::new(MockSender::new());
        mock.respond(
            Method::Get,
            "pools",
            json!([{"poolid": "lab", "comment": "lab machines"}, {"poolid": "prod"}]),
        );
        mock.respond(
            Method::Get,
            "pools/lab",
            json!({
                "comment": "lab machines",
                "members": [{"id": "qemu/100", "type": "qemu", "node": "pve1", "vmid": 100}]
            }),
        );
        mock
    }

    #[tokio::test]
    async fn test_list_returns_stubs() {
        let mock = mock_pools();
        let pools = PoolService::new(mock.clone()).list().await.unwrap();

        assert_eq!(pools.iter().map(Pool::name).collect::<Vec<_>>(), vec!["lab", "prod"]);
        assert!(pools.iter().all(|p| !p.is_full()));
        assert_eq!(mock.count(Method::Get, "pools/lab"), 0);
    }

    #[tokio::test]
    async fn test_members_hydrate_once() {
        let mock = mock_pools();
        let mut pool = PoolService::new(mock.clone()).stub("lab");

        assert_eq!(pool.members().await.unwrap()[0].vmid, Some(100));
        assert_eq!(pool.description().await.unwrap(), "lab machines");
        assert!(pool.extras().await.unwrap().is_empty());
        assert_eq!(mock.count(Method::Get, "pools/lab"), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_pool() {
        let mock = mock_pools();
        let err = PoolService::new(mock.clone()).get("staging").await.err().unwrap();
        assert!(matches!(err, Error::NotFound { resource: "pool", .. }));
        assert_eq!(mock.count(Method::Get, "pools/staging"), 0);
    }

    #[tokio::test]
    async fn test_set_description_sends_comment() {
        let mock = mock_pools();
        mock.respond(Method::Put, "pools/lab", json!(null));

        let mut pool = PoolService::new(mock.clone()).get("lab").await.unwrap();
        pool.set_description("").await.unwrap();

        let call = mock.last_call(Method::Put, "pools/lab").unwrap();
        assert_eq!(call.values.get("comment"), Some(""));
        assert_eq!(pool.description().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cached_description() {
        let mock = mock_pools();
        mock.fail(Method::Put, "pools/lab", "API request failed: 403 Forbidden");

        let mut pool = PoolService::new(mock.clone()).get("lab").await.unwrap();
        assert!(pool.set_description("renamed").await.is_err());
        assert_eq!(pool.description().await.unwrap(), "lab machines");
    }

    #[tokio::test]
    async fn test_delete() {
        let mock = mock_pools();
        mock.respond(Method::Delete, "pools/prod", json!(null));

        PoolService::new(mock.clone()).stub("prod").delete().await.unwrap();
        assert_eq!(mock.count(Method::Delete, "pools/prod"), 1);
    }
}
