use std::sync::Arc;
use crate::application::services::PredictionService;

/// Shared state for the axum handlers: the use cases, never the adapters directly.
#[derive(Clone)]
pub struct HttpState {
    /// Decode, detect, annotate and encode one uploaded image.
    pub prediction: Arc<PredictionService>,
}
