//! Asset management system
//!
//! Exhibit models are expensive to load and cheap to clone. The
//! [`PrototypePool`] keeps a small number of loaded prototypes resident and
//! hands out independent instances; the actual loading is delegated to a
//! [`PrototypeLoader`].

pub mod memory_pressure;
pub mod model;
pub mod prototype_pool;
pub mod ron_loader;

pub use memory_pressure::{Evictable, MemoryPressureObserver, MemoryPressureSignal};
pub use model::{Model, ModelNode};
pub use prototype_pool::PrototypePool;
pub use ron_loader::RonModelLoader;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a loadable asset
///
/// Opaque; two identifiers are equal only when their strings match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Loads prototypes for the pool
///
/// Implementations may block on I/O; the pool never holds its lock while a
/// load is running.
pub trait PrototypeLoader: Send + Sync {
    /// Loaded prototype type
    type Prototype: Clone + Send + Sync + 'static;

    /// Load the prototype named by `id`
    fn load_prototype(&self, id: &AssetId) -> Result<Self::Prototype, AssetError>;
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(AssetId),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data in {id}: {reason}")]
    InvalidData {
        /// Asset being parsed
        id: AssetId,
        /// Parser message
        reason: String,
    },

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
