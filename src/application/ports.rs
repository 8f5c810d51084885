use async_trait::async_trait;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{
    detection::Detection,
    errors::DomainResult,
    labels::LabelSet,
    model::{ModelId, YoloParams},
};

/// The black-box detector: image in, `(x1, y1, x2, y2, score, class)` boxes out,
/// in source-image pixel coordinates.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image: Arc<RgbImage>, params: &YoloParams) -> DomainResult<Vec<Detection>>;
}

pub trait AnnotatorPort: Send + Sync {
    /// Draws every detection onto `image` and hands it back. Fails as a whole:
    /// no partially annotated image is ever returned.
    fn annotate(
        &self,
        image: RgbImage,
        detections: &[Detection],
        labels: &LabelSet,
    ) -> DomainResult<RgbImage>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

#[async_trait]
pub trait ImageStorePort: Send + Sync {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> DomainResult<PathBuf>;
}
