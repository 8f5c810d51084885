use async_trait::async_trait;
use image::RgbImage;
use std::sync::{Arc, Mutex};

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::{ModelId, YoloParams},
};

/// Process-wide detector. The ONNX session is loaded once and shared by all
/// requests; runs are serialized through the mutex and executed on the
/// blocking pool.
pub struct OnnxDetector {
    engine: Arc<Mutex<OnnxYoloEngine>>,
}

impl OnnxDetector {
    pub fn load(model: &ModelId, use_cuda: bool) -> DomainResult<Self> {
        let engine = OnnxYoloEngine::load(&model.onnx_path, use_cuda).map_err(|e| {
            DomainError::OperationFailed(format!("loading model {}: {e:#}", model.name))
        })?;
        Ok(Self { engine: Arc::new(Mutex::new(engine)) })
    }
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image: Arc<RgbImage>, params: &YoloParams) -> DomainResult<Vec<Detection>> {
        let engine = self.engine.clone();
        let params = params.clone();

        tokio::task::spawn_blocking(move || {
            let mut engine = engine
                .lock()
                .map_err(|_| DomainError::OperationFailed("inference session lock poisoned".into()))?;
            engine.infer(&image, &params).map_err(|e| match e.downcast::<DomainError>() {
                Ok(domain) => domain,
                Err(other) => DomainError::OperationFailed(format!("inference: {other:#}")),
            })
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("inference task failed: {e}")))?
    }
}
