use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::detection::DetectionResult;

pub const HEALTH_MESSAGE: &str = "Brain Tumor Classification API is up and running!";

/// Outcome of one `/predict` call, still in memory.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub request_id: Uuid,
    pub image: Vec<u8>,
    pub media_type: &'static str,
    pub results: Vec<DetectionResult>,
}

impl Prediction {
    /// JSON list carried in the `prediction` response header.
    pub fn results_header(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.results)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { message: HEALTH_MESSAGE.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_header_is_a_json_array() {
        let prediction = Prediction {
            request_id: Uuid::nil(),
            image: vec![],
            media_type: "image/png",
            results: vec![DetectionResult {
                class_name: "glioma".into(),
                confidence: 0.87,
                bbox: [10, 10, 50, 50],
            }],
        };
        assert_eq!(
            prediction.results_header().unwrap(),
            r#"[{"class_name":"glioma","confidence":0.87,"box":[10,10,50,50]}]"#
        );
    }

    #[test]
    fn empty_results_header() {
        let prediction = Prediction {
            request_id: Uuid::nil(),
            image: vec![],
            media_type: "image/jpeg",
            results: vec![],
        };
        assert_eq!(prediction.results_header().unwrap(), "[]");
    }
}
