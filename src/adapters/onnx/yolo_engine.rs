use anyhow::{bail, Result};
use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::{Array4, ArrayViewD, Axis, Ix2, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use tracing::{info, warn};

use super::postprocess::{decode_candidates, non_maximum_suppression, Letterbox, PAD_VALUE};
use crate::domain::detection::Detection;
use crate::domain::model::YoloParams;

pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &str, use_cuda: bool) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA is optional: register it when asked for and available, otherwise stay on CPU.
        if use_cuda {
            let cuda = CUDAExecutionProvider::default().build();
            match builder.clone().with_execution_providers([cuda]) {
                Ok(builder_with_cuda) => builder = builder_with_cuda,
                Err(e) => warn!("CUDA execution provider unavailable, using CPU: {e}"),
            }
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;
        info!("🧩 Model loaded: {} ({} bytes)", path, model_bytes.len());

        Ok(Self { session })
    }

    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<Detection>> {
        let imgsz = params.input_size as usize;
        let letterbox = Letterbox::fit(rgb.width(), rgb.height(), params.input_size);
        let (new_w, new_h) = letterbox.scaled_size();
        let resized = image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle);
        let mut canvas = RgbImage::from_pixel(params.input_size, params.input_size, Rgb([PAD_VALUE; 3]));
        image::imageops::overlay(&mut canvas, &resized, letterbox.pad_x as i64, letterbox.pad_y as i64);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in canvas.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Tensor::from_array((input_shape, data))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[0] != 1 {
            bail!("unexpected output shape {:?}, expected [1, 4 + classes, candidates]", dims);
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let head = array_view.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;

        let candidates = decode_candidates(head, &letterbox, params.conf_threshold)?;
        Ok(non_maximum_suppression(candidates, params))
    }
}
