use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{PolicyRepository, StoreError};
use crate::policy::PolicyBundle;

/// Repository persisting the bundle as a single JSON document on disk.
#[derive(Debug)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl PolicyRepository for FileRepository {
    async fn get(&self) -> Result<PolicyBundle, StoreError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::Empty),
            Err(e) => return Err(e.into()),
        };
        let bundle = serde_json::from_str(&json)?;
        debug!("Loaded policy bundle from {:?}", self.path);
        Ok(bundle)
    }

    async fn save(&self, bundle: &PolicyBundle) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(bundle)?;
        fs::write(&self.path, json).await?;
        debug!(
            "Saved policy bundle version {} to {:?}",
            bundle.version, self.path
        );
        Ok(())
    }
}
