use async_trait::async_trait;
use parking_lot::RwLock;

use super::{PolicyRepository, StoreError};
use crate::policy::PolicyBundle;

/// Process-local repository holding at most one bundle. Used by tests and
/// ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    bundle: RwLock<Option<PolicyBundle>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded with a bundle.
    pub fn seeded(bundle: PolicyBundle) -> Self {
        Self {
            bundle: RwLock::new(Some(bundle)),
        }
    }
}

#[async_trait]
impl PolicyRepository for MemoryRepository {
    async fn get(&self) -> Result<PolicyBundle, StoreError> {
        self.bundle.read().clone().ok_or(StoreError::Empty)
    }

    async fn save(&self, bundle: &PolicyBundle) -> Result<(), StoreError> {
        *self.bundle.write() = Some(bundle.clone());
        Ok(())
    }
}
