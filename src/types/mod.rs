//! Typed resource properties
//!
//! Wire records arrive as [`Properties`] bags and are decoded through the
//! per-kind descriptor tables into validated structures.
//!
//! # Module Structure
//!
//! - [`properties`] - The loosely-typed property bag
//! - [`codec`] - Descriptors, the [`PropertyCodec`] trait and [`Detail`]
//! - [`vm`] - Guests (QEMU and LXC)
//! - [`pool`] - Resource pools
//! - [`storage`] - Storage backends

pub mod codec;
pub mod pool;
pub mod properties;
pub mod storage;
pub mod vm;

pub use codec::{Detail, Literal, Presence, PropertyCodec, PropertyDescriptor, PropertyKind};
pub use properties::Properties;
