use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};
use super::labels::LabelSet;

/// Values per raw detection row: `x1, y1, x2, y2, confidence, class_id`.
pub const DETECTION_ARITY: usize = 6;

/// One predicted object: corner coordinates in pixels of the source image,
/// confidence in `[0, 1]` and an index into the label set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: usize) -> Self {
        Self { x1, y1, x2, y2, score, class_id }
    }

    /// Decodes a flat `[x1, y1, x2, y2, score, class]` row as produced by the model
    /// post-processing. The class value must be a non-negative integer.
    pub fn from_row(row: &[f32]) -> DomainResult<Self> {
        let &[x1, y1, x2, y2, score, class] = row else {
            return Err(DomainError::MalformedDetection(format!(
                "expected {DETECTION_ARITY} values, got {}",
                row.len()
            )));
        };

        if !class.is_finite() || class < 0.0 || class.fract() != 0.0 {
            return Err(DomainError::MalformedDetection(format!("class id {class} is not a valid index")));
        }

        Ok(Self::new(x1, y1, x2, y2, score, class as usize))
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

/// Wire summary of a detection, as returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub class_name: String,
    pub confidence: f64,
    #[serde(rename = "box")]
    pub bbox: [i64; 4],
}

impl DetectionResult {
    pub fn from_detection(det: &Detection, labels: &LabelSet) -> DomainResult<Self> {
        Ok(Self {
            class_name: labels.name(det.class_id)?.to_string(),
            confidence: widen_score(det.score),
            // truncation toward zero, like an integer cast of the model output
            bbox: [det.x1 as i64, det.y1 as i64, det.x2 as i64, det.y2 as i64],
        })
    }
}

// f32 -> f64 without the trailing noise (0.87f32 would otherwise print as 0.8700000047683716).
fn widen_score(score: f32) -> f64 {
    (score as f64 * 1e6).round() / 1e6
}

pub fn summarize(results: &[DetectionResult]) -> String {
    if results.is_empty() {
        return "nothing detected".to_string();
    }
    results
        .iter()
        .map(|r| format!("{} ({:.2})", r.class_name, r.confidence))
        .collect::<Vec<_>>()
        .join(", ")
}
