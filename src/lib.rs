//! Typed client for the Proxmox VE management API.
//!
//! Listings return lightweight stub entities carrying identity only; the
//! first access to configuration hydrates the entity from its detail record
//! and caches it. Property values are decoded and validated against
//! per-kind descriptor tables, and every unrecognised wire field is kept as
//! an extra.
//!
//! # Module Structure
//!
//! - [`api`] - Request collaborator: HTTP client and in-memory mock
//! - [`types`] - Property bags, descriptors and typed properties
//! - [`service`] - Services and lazily hydrated entities
//! - [`config`] - Persistent and environment configuration
//! - [`error`] - Error type shared by codec and services

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use api::client::PveClient;
pub use api::{Method, RequestSender, RequestValues};
pub use config::Config;
pub use error::{Error, Result};
pub use service::{
    Api, Hydration, LxcVirtualMachine, Pool, PoolService, QemuVirtualMachine, Storage,
    StorageService, VirtualMachine, VmService,
};
pub use types::{Detail, Properties, PropertyCodec, PropertyDescriptor};
