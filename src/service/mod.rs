//! Resource services
//!
//! Services turn listings and detail records into entities. Every entity
//! keeps a clone of its service, which in turn shares the request sender;
//! the handle is only used to hydrate and mutate, never to own the entity.
//!
//! # Module Structure
//!
//! - [`entity`] - The stub/full hydration state machine
//! - [`vm`] - Guests (`cluster/resources`, `nodes/{node}/{kind}/{vmid}`)
//! - [`pool`] - Resource pools (`pools`)
//! - [`storage`] - Storage definitions (`storage`)

pub mod entity;
pub mod pool;
pub mod storage;
pub mod vm;

pub use entity::Hydration;
pub use pool::{Pool, PoolService};
pub use storage::{Storage, StorageService};
pub use vm::{Guest, GuestConfig, LxcVirtualMachine, QemuVirtualMachine, VirtualMachine, VmService};

use crate::api::{Method, RequestSender, RequestValues};
use crate::error::{Error, Result};
use crate::types::Properties;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Entry point bundling the services around one request sender
#[derive(Clone)]
pub struct Api {
    sender: Arc<dyn RequestSender>,
}

impl Api {
    pub fn new(sender: Arc<dyn RequestSender>) -> Self {
        Self { sender }
    }

    pub fn vms(&self) -> VmService {
        VmService::new(self.sender.clone())
    }

    pub fn pools(&self) -> PoolService {
        PoolService::new(self.sender.clone())
    }

    pub fn storage(&self) -> StorageService {
        StorageService::new(self.sender.clone())
    }
}

/// Percent-encode one path segment
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// `GET` a record that must be a JSON object
pub(crate) async fn fetch_object(sender: &dyn RequestSender, path: &str) -> Result<Properties> {
    match sender.send(Method::Get, path, &RequestValues::new()).await? {
        Value::Object(map) => Ok(Properties::from(map)),
        other => Err(Error::invalid("data", other)),
    }
}

/// `GET` a listing that must be an array of JSON objects
pub(crate) async fn fetch_rows(
    sender: &dyn RequestSender,
    path: &str,
    values: &RequestValues,
) -> Result<Vec<Properties>> {
    match sender.send(Method::Get, path, values).await? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(Properties::from(map)),
                other => Err(Error::invalid("data", other)),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::invalid("data", other)),
    }
}

/// Task identifier (UPID) returned by asynchronous operations
pub(crate) fn task_id(data: Value) -> Result<String> {
    match data {
        Value::String(upid) => Ok(upid),
        other => Err(Error::invalid("data", other)),
    }
}
