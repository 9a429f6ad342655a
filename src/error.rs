//! Error types for the property codec and entity services.

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by decoding, encoding, hydration and mutation.
#[derive(Error, Debug)]
pub enum Error {
    /// A required wire property was absent.
    #[error("missing property: {name}")]
    MissingProperty { name: String },

    /// A wire property was present but had the wrong shape or was out of range.
    #[error("invalid property {name}: {value}")]
    InvalidProperty { name: String, value: Value },

    /// The identity has no corresponding remote resource.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Failure reported by the request collaborator, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    pub fn missing(name: &str) -> Self {
        Error::MissingProperty {
            name: name.to_string(),
        }
    }

    pub fn invalid(name: &str, value: impl Into<Value>) -> Self {
        Error::InvalidProperty {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Result type alias for codec and service operations.
pub type Result<T> = std::result::Result<T, Error>;
