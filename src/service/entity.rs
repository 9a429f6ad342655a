//! Entity hydration state
//!
//! Entities start as stubs carrying identity only and move to full exactly
//! once. The transition either completes with the loaded value or leaves
//! the stub untouched.

use crate::error::Result;
use std::future::Future;

/// Stub or fully loaded detail of an entity
#[derive(Debug, Clone, PartialEq)]
pub enum Hydration<T> {
    Stub,
    Full(T),
}

impl<T> Default for Hydration<T> {
    fn default() -> Self {
        Hydration::Stub
    }
}

impl<T> Hydration<T> {
    pub fn is_full(&self) -> bool {
        matches!(self, Hydration::Full(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Hydration::Full(value) => Some(value),
            Hydration::Stub => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Hydration::Full(value) => Some(value),
            Hydration::Stub => None,
        }
    }

    /// Return the full value, running `load` first when still a stub.
    ///
    /// `load` is not called on a full value. If it fails the state stays
    /// `Stub` and the error is returned.
    pub async fn get_or_try_load<F, Fut>(&mut self, load: F) -> Result<&mut T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Hydration::Stub = self {
            let value = load().await?;
            *self = Hydration::Full(value);
        }

        match self {
            Hydration::Full(value) => Ok(value),
            Hydration::Stub => unreachable!("stub after successful load"),
        }
    }
}
