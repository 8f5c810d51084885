use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::application::ports::AnnotatorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    labels::LabelSet,
};

static FONT_DATA: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");

#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    /// Outline thickness; grows inward from the detection corners.
    pub stroke_width: u32,
    /// Space between the label text and its background edge.
    pub padding: u32,
    pub box_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
    pub font_px: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            stroke_width: 3,
            padding: 5,
            box_color: Rgb([255, 0, 0]),
            text_color: Rgb([255, 255, 255]),
            font_px: 14.0,
        }
    }
}

/// Draws a red box plus a `"{class}: {conf:.2}"` tag above its top-left corner
/// for every detection.
pub struct ImageAnnotator {
    font: FontRef<'static>,
    style: AnnotationStyle,
}

impl ImageAnnotator {
    pub fn new(style: AnnotationStyle) -> DomainResult<Self> {
        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|e| DomainError::OperationFailed(format!("embedded font: {e}")))?;
        Ok(Self { font, style })
    }

    fn draw_outline(&self, image: &mut RgbImage, (x1, y1, x2, y2): (i32, i32, i32, i32)) {
        for inset in 0..self.style.stroke_width as i32 {
            let (left, top) = (x1 + inset, y1 + inset);
            let (right, bottom) = (x2 - inset, y2 - inset);
            if right < left || bottom < top {
                break;
            }
            let rect = Rect::at(left, top)
                .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
            draw_hollow_rect_mut(image, rect, self.style.box_color);
        }
    }

    fn draw_tag(&self, image: &mut RgbImage, x1: i32, y1: i32, text: &str) {
        let scale = PxScale::from(self.style.font_px);
        let (text_w, text_h) = text_size(scale, &self.font, text);
        let pad = self.style.padding;
        let top = y1 - text_h as i32 - pad as i32;

        let background = Rect::at(x1, top).of_size(text_w + pad + 1, text_h + pad + 1);
        draw_filled_rect_mut(image, background, self.style.box_color);
        draw_text_mut(
            image,
            self.style.text_color,
            x1 + pad as i32,
            top,
            scale,
            &self.font,
            text,
        );
    }
}

impl AnnotatorPort for ImageAnnotator {
    fn annotate(
        &self,
        mut image: RgbImage,
        detections: &[Detection],
        labels: &LabelSet,
    ) -> DomainResult<RgbImage> {
        // resolve every tag first so a bad class id leaves nothing half drawn
        let tags = detections
            .iter()
            .map(|det| label_text(det, labels))
            .collect::<DomainResult<Vec<_>>>()?;

        for (det, tag) in detections.iter().zip(&tags) {
            let corners = pixel_corners(det, image.dimensions());
            self.draw_outline(&mut image, corners);
            self.draw_tag(&mut image, corners.0, corners.1, tag);
        }
        Ok(image)
    }
}

pub fn label_text(det: &Detection, labels: &LabelSet) -> DomainResult<String> {
    Ok(format!("{}: {:.2}", labels.name(det.class_id)?, det.score))
}

/// Rounds to pixel corners, pulling far-away coordinates in to a margin past
/// the canvas so the stroke and tag arithmetic cannot overflow `i32`.
fn pixel_corners(det: &Detection, (width, height): (u32, u32)) -> (i32, i32, i32, i32) {
    let limit = width.max(height) as f32 + 65_536.0;
    let px = |v: f32| v.round().clamp(-limit, limit) as i32;
    let (x1, x2) = (det.x1.min(det.x2), det.x1.max(det.x2));
    let (y1, y2) = (det.y1.min(det.y2), det.y1.max(det.y2));
    (px(x1), px(y1), px(x2), px(y2))
}
