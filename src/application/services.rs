use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    application::{
        codec::{decode_rgb, encode},
        dto::Prediction,
        ports::{AnnotatorPort, DetectorPort, ImageStorePort, ModelCatalogPort},
    },
    domain::{
        detection::{summarize, DetectionResult},
        errors::{DomainError, DomainResult},
        labels::LabelSet,
        model::{ModelId, OutputFormat, YoloParams},
    },
};

/// Upload → detect → annotate → encode, one call per HTTP request.
/// Holds no per-request state; the detector is the only shared resource.
#[derive(Clone)]
pub struct PredictionService {
    detector: Arc<dyn DetectorPort>,
    annotator: Arc<dyn AnnotatorPort>,
    store: Option<Arc<dyn ImageStorePort>>,
    labels: Arc<LabelSet>,
    params: YoloParams,
    format: OutputFormat,
}

impl PredictionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        annotator: Arc<dyn AnnotatorPort>,
        labels: LabelSet,
        params: YoloParams,
    ) -> Self {
        Self {
            detector,
            annotator,
            store: None,
            labels: Arc::new(labels),
            params,
            format: OutputFormat::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Also keep a copy of every annotated image, named after its request id.
    pub fn with_store(mut self, store: Arc<dyn ImageStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn predict(&self, upload: Vec<u8>) -> DomainResult<Prediction> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let image = run_blocking(move || decode_rgb(&upload)).await?;
        let (width, height) = image.dimensions();
        let image = Arc::new(image);

        let t_infer = Instant::now();
        let detections = self.detector.detect(image.clone(), &self.params).await?;
        debug!(%request_id, infer_ms = t_infer.elapsed().as_millis() as u64, "inference done");

        let results = detections
            .iter()
            .map(|det| DetectionResult::from_detection(det, &self.labels))
            .collect::<DomainResult<Vec<_>>>()?;

        // the detector may still hold a handle; copy only in that case
        let image = Arc::try_unwrap(image).unwrap_or_else(|shared| (*shared).clone());
        let annotator = self.annotator.clone();
        let labels = self.labels.clone();
        let format = self.format;
        let encoded = run_blocking(move || {
            let annotated = annotator.annotate(image, &detections, &labels)?;
            encode(&annotated, format)
        })
        .await?;

        if let Some(store) = &self.store {
            let name = format!("{request_id}.{}", format.extension());
            let path = store.save(&name, &encoded).await?;
            debug!(%request_id, path = %path.display(), "annotated image saved");
        }

        info!(
            %request_id,
            width,
            height,
            total_ms = started.elapsed().as_millis() as u64,
            "🧠 {}",
            summarize(&results)
        );

        Ok(Prediction {
            request_id,
            image: encoded,
            media_type: format.media_type(),
            results,
        })
    }
}

/// Runs CPU-bound image work off the async executor.
async fn run_blocking<T, F>(f: F) -> DomainResult<T>
where
    F: FnOnce() -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::OperationFailed(format!("worker task failed: {e}")))?
}

/// Validates the model artifact before anything tries to load it.
#[derive(Clone)]
pub struct ModelService {
    catalog: Arc<dyn ModelCatalogPort>,
}

impl ModelService {
    pub fn new(catalog: Arc<dyn ModelCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn check(&self, model: &ModelId) -> DomainResult<()> {
        self.catalog.validate_model(model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::detection::Detection;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FixedDetector(Vec<Detection>);

    #[async_trait]
    impl DetectorPort for FixedDetector {
        async fn detect(&self, _image: Arc<RgbImage>, _params: &YoloParams) -> DomainResult<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    struct FailingDetector;

    #[async_trait]
    impl DetectorPort for FailingDetector {
        async fn detect(&self, _image: Arc<RgbImage>, _params: &YoloParams) -> DomainResult<Vec<Detection>> {
            Err(DomainError::OperationFailed("session run failed".into()))
        }
    }

    /// Marks the top-left pixel so tests can tell annotation happened.
    struct MarkingAnnotator;

    impl AnnotatorPort for MarkingAnnotator {
        fn annotate(&self, mut image: RgbImage, detections: &[Detection], labels: &LabelSet) -> DomainResult<RgbImage> {
            for det in detections {
                labels.name(det.class_id)?;
            }
            if !detections.is_empty() {
                image.put_pixel(0, 0, Rgb([255, 0, 0]));
            }
            Ok(image)
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<Vec<(String, usize)>>);

    #[async_trait]
    impl ImageStorePort for MemoryStore {
        async fn save(&self, file_name: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
            self.0.lock().unwrap().push((file_name.to_string(), bytes.len()));
            Ok(PathBuf::from(file_name))
        }
    }

    fn png_upload() -> Vec<u8> {
        encode(&RgbImage::from_pixel(64, 64, Rgb([0, 0, 0])), OutputFormat::Png).unwrap()
    }

    fn service(detector: Arc<dyn DetectorPort>) -> PredictionService {
        PredictionService::new(
            detector,
            Arc::new(MarkingAnnotator),
            LabelSet::default(),
            YoloParams::default(),
        )
        .with_format(OutputFormat::Png)
    }

    #[tokio::test]
    async fn predict_returns_results_and_annotated_image() {
        let det = Detection::new(10.0, 10.0, 50.0, 50.0, 0.87, 2);
        let svc = service(Arc::new(FixedDetector(vec![det])));

        let prediction = svc.predict(png_upload()).await.unwrap();
        assert_eq!(prediction.media_type, "image/png");
        assert_eq!(prediction.results.len(), 1);
        assert_eq!(prediction.results[0].class_name, "glioma");
        assert_eq!(prediction.results[0].bbox, [10, 10, 50, 50]);

        let out = decode_rgb(&prediction.image).unwrap();
        assert_eq!(*out.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[tokio::test]
    async fn no_detections_gives_empty_results() {
        let svc = service(Arc::new(FixedDetector(vec![])));
        let prediction = svc.predict(png_upload()).await.unwrap();
        assert!(prediction.results.is_empty());
        let out = decode_rgb(&prediction.image).unwrap();
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[tokio::test]
    async fn undecodable_upload_is_a_client_error() {
        let svc = service(Arc::new(FixedDetector(vec![])));
        let err = svc.predict(b"not an image".to_vec()).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn unknown_class_fails_the_request() {
        let det = Detection::new(10.0, 10.0, 50.0, 50.0, 0.9, 11);
        let svc = service(Arc::new(FixedDetector(vec![det])));
        let err = svc.predict(png_upload()).await.unwrap_err();
        assert!(matches!(err, DomainError::LabelOutOfRange { class_id: 11, .. }));
    }

    #[tokio::test]
    async fn detector_failure_propagates() {
        let svc = service(Arc::new(FailingDetector));
        let err = svc.predict(png_upload()).await.unwrap_err();
        assert!(matches!(err, DomainError::OperationFailed(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn store_receives_one_file_per_request() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(Arc::new(FixedDetector(vec![]))).with_store(store.clone());

        let a = svc.predict(png_upload()).await.unwrap();
        let b = svc.predict(png_upload()).await.unwrap();
        assert_ne!(a.request_id, b.request_id);

        let saved = store.0.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].0, format!("{}.png", a.request_id));
        assert_eq!(saved[1].0, format!("{}.png", b.request_id));
        assert_eq!(saved[0].1, a.image.len());
    }
}
