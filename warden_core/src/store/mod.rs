//! Persistence of the authoritative policy bundle.
//!
//! The enforcer consumes the [`PolicyRepository`] capability and never a
//! concrete store; a file-backed and an in-memory implementation ship with
//! the crate.

mod filesystem;
mod memory;

pub use filesystem::FileRepository;
pub use memory::MemoryRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::policy::PolicyBundle;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no policy bundle stored")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage capability for the single authoritative [`PolicyBundle`].
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// The current bundle, or [`StoreError::Empty`] when none was ever saved.
    async fn get(&self) -> Result<PolicyBundle, StoreError>;

    /// Replace the stored bundle with the given one.
    async fn save(&self, bundle: &PolicyBundle) -> Result<(), StoreError>;
}
