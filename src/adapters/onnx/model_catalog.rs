use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::ModelId;

pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }
}

impl Default for OnnxModelCatalog {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        let path = Path::new(&model.onnx_path);
        let is_onnx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));
        if !is_onnx {
            return Err(DomainError::InvalidInput(format!(
                "model must be an .onnx export: {}",
                model.onnx_path
            )));
        }
        let exists = tokio::fs::try_exists(path).await.map_err(|e| {
            DomainError::OperationFailed(format!("checking model file {}: {e}", model.onnx_path))
        })?;
        if !exists {
            return Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_path() {
        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rejects_pytorch_weights() {
        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path("models/best.pt"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path("/nowhere/best.onnx"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_path_is_an_operation_failure() {
        // a regular file used as a directory: stat fails with ENOTDIR, not ENOENT
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("weights");
        std::fs::write(&file, b"stub").unwrap();
        let err = OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path(file.join("best.onnx").to_string_lossy()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::OperationFailed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn accepts_existing_onnx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.onnx");
        std::fs::write(&path, b"stub").unwrap();
        OnnxModelCatalog::new()
            .validate_model(&ModelId::from_path(path.to_string_lossy()))
            .await
            .unwrap();
    }
}
