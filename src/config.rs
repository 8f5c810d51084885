use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ModelId, OutputFormat, YoloParams};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "APP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// ONNX model path
    #[arg(long, env = "APP_MODEL", default_value = "models/best.onnx")]
    pub model: String,

    /// Class names, one per line. The built-in tumor classes are used when omitted.
    #[arg(long, env = "APP_LABELS")]
    pub labels: Option<PathBuf>,

    /// Square network input size
    #[arg(long, env = "APP_IMGSZ", default_value_t = 416)]
    pub imgsz: u32,

    /// Minimum confidence for a detection to be reported
    #[arg(long, env = "APP_CONF", default_value_t = 0.5)]
    pub conf: f32,

    /// IoU above which same-class boxes are suppressed
    #[arg(long, env = "APP_IOU", default_value_t = 0.7)]
    pub iou: f32,

    #[arg(long, env = "APP_MAX_DET", default_value_t = 300)]
    pub max_det: usize,

    /// Encoding of the returned image: jpeg or png
    #[arg(long, env = "APP_FORMAT", default_value_t = OutputFormat::Jpeg)]
    pub format: OutputFormat,

    /// Keep a copy of each annotated image here, named by request id
    #[arg(long, env = "APP_SAVE_DIR")]
    pub save_dir: Option<PathBuf>,

    #[arg(long, env = "APP_MAX_UPLOAD_MB", default_value_t = 10)]
    pub max_upload_mb: usize,

    /// Try the CUDA execution provider before falling back to CPU
    #[arg(long, env = "APP_CUDA")]
    pub cuda: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> DomainResult<()> {
        for (name, value) in [("conf", self.conf), ("iou", self.iou)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::InvalidInput(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        if self.imgsz == 0 || self.imgsz % 32 != 0 {
            return Err(DomainError::InvalidInput(format!(
                "imgsz must be a positive multiple of 32, got {}",
                self.imgsz
            )));
        }
        if self.max_det == 0 {
            return Err(DomainError::InvalidInput("max-det must be at least 1".into()));
        }
        if self.max_upload_mb == 0 {
            return Err(DomainError::InvalidInput("max-upload-mb must be at least 1".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> DomainResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DomainError::InvalidInput(format!("bind address {}:{}: {e}", self.host, self.port)))
    }

    pub fn model_id(&self) -> ModelId {
        ModelId::from_path(self.model.clone())
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.imgsz,
            conf_threshold: self.conf,
            iou_threshold: self.iou,
            max_detections: self.max_det,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
