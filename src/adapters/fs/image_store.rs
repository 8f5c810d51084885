use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ports::ImageStorePort;
use crate::domain::errors::{DomainError, DomainResult};

/// Writes annotated images into one directory. Names are chosen by the caller
/// (a fresh request id each time), so concurrent requests never share a file.
pub struct DirImageStore {
    root: PathBuf,
}

impl DirImageStore {
    pub async fn create(root: impl Into<PathBuf>) -> DomainResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            DomainError::OperationFailed(format!("creating {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageStorePort for DirImageStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let is_plain_name = Path::new(file_name)
            .file_name()
            .is_some_and(|n| n == file_name);
        if !is_plain_name {
            return Err(DomainError::InvalidInput(format!("not a plain file name: {file_name}")));
        }

        let path = self.root.join(file_name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            DomainError::OperationFailed(format!("writing {}: {e}", path.display()))
        })?;
        Ok(path)
    }
}
