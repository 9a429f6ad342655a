//! Proxmox VE API interaction module
//!
//! This module provides the request-sending collaborator consumed by the
//! entity services: the [`RequestSender`] trait, the HTTP implementation
//! and an in-memory implementation for tests.
//!
//! # Module Structure
//!
//! - [`client`] - Main API client (base URL, API token, path building)
//! - [`http`] - HTTP utilities for REST API calls
//! - [`mock`] - In-memory sender with scripted responses and call recording
//! - [`request`] - Ordered request values and HTTP verbs
//!
//! # Example
//!
//! ```ignore
//! use pvectl::api::{client::PveClient, Method, RequestSender, RequestValues};
//!
//! async fn example(config: &pvectl::config::Config) -> anyhow::Result<()> {
//!     let client = PveClient::from_config(config)?;
//!     let nextid = client.send(Method::Get, "cluster/nextid", &RequestValues::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod mock;
pub mod request;

pub use request::{Method, RequestValues};

use async_trait::async_trait;
use serde_json::Value;

/// Performs one remote call and returns the decoded `data` payload.
///
/// Implementations own transport concerns (TLS, credentials, timeouts) and
/// must be safe to share across unrelated entities.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        values: &RequestValues,
    ) -> anyhow::Result<Value>;
}
