use ndarray::ArrayView2;

use crate::domain::detection::Detection;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::YoloParams;

/// Grey used for the letterbox borders, as in the training pipeline.
pub const PAD_VALUE: u8 = 114;

/// Geometry of a letterboxed network input: the source image scaled by
/// `ratio` (aspect preserved) and centred between `pad_x`/`pad_y` borders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub ratio: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub src_w: u32,
    pub src_h: u32,
}

impl Letterbox {
    pub fn fit(src_w: u32, src_h: u32, input_size: u32) -> Self {
        let ratio = (input_size as f32 / src_w as f32).min(input_size as f32 / src_h as f32);
        let mut lb = Self { ratio, pad_x: 0, pad_y: 0, src_w, src_h };
        let (new_w, new_h) = lb.scaled_size();
        lb.pad_x = input_size.saturating_sub(new_w) / 2;
        lb.pad_y = input_size.saturating_sub(new_h) / 2;
        lb
    }

    /// Size of the resized source inside the square input.
    pub fn scaled_size(&self) -> (u32, u32) {
        (
            ((self.src_w as f32 * self.ratio).round() as u32).max(1),
            ((self.src_h as f32 * self.ratio).round() as u32).max(1),
        )
    }

    /// Maps a point of the network input back to source pixels, clipped to the image.
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            ((x - self.pad_x as f32) / self.ratio).clamp(0.0, self.src_w as f32),
            ((y - self.pad_y as f32) / self.ratio).clamp(0.0, self.src_h as f32),
        )
    }
}

/// Decodes a YOLOv8/11 head laid out as `[4 + num_classes, num_candidates]`
/// (`cx, cy, w, h` followed by one score per class). Boxes are mapped back
/// through `letterbox` to source-image pixels and clipped to its bounds.
pub fn decode_candidates(
    view: ArrayView2<f32>,
    letterbox: &Letterbox,
    conf_threshold: f32,
) -> DomainResult<Vec<Detection>> {
    let rows = view.shape()[0];
    if rows <= 4 {
        return Err(DomainError::MalformedDetection(format!(
            "output head has {rows} rows, expected box + class scores"
        )));
    }

    let mut detections = Vec::new();
    for candidate in view.columns() {
        let Some((class_id, score)) = candidate
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        if score <= conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (candidate[0], candidate[1], candidate[2], candidate[3]);
        let (x1, y1) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);
        detections.push(Detection::from_row(&[x1, y1, x2, y2, score, class_id as f32])?);
    }
    Ok(detections)
}

/// Greedy class-aware NMS; output is sorted by descending score and capped.
pub fn non_maximum_suppression(mut detections: Vec<Detection>, params: &YoloParams) -> Vec<Detection> {
    detections.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len().min(params.max_detections));
    for det in detections {
        if kept.len() >= params.max_detections {
            break;
        }
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == det.class_id && k.iou(&det) > params.iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}
