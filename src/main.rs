use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tumor_detect_api::{
    adapters::{
        fs::image_store::DirImageStore,
        http::{router, state::HttpState},
        onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
        render::annotator::{AnnotationStyle, ImageAnnotator},
    },
    application::services::{ModelService, PredictionService},
    config::ServerConfig,
    domain::labels::LabelSet,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG, info by default)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    config.validate()?;
    let addr = config.bind_addr()?;

    // 2. Labels and model, loaded once for the whole process
    let labels = match &config.labels {
        Some(path) => LabelSet::from_file(path)?,
        None => LabelSet::default(),
    };
    tracing::info!("🏷️ {} classes loaded", labels.len());

    let model = config.model_id();
    ModelService::new(Arc::new(OnnxModelCatalog::new())).check(&model).await?;
    let detector = Arc::new(OnnxDetector::load(&model, config.cuda)?);
    let annotator = Arc::new(ImageAnnotator::new(AnnotationStyle::default())?);

    // 3. Use case
    let mut prediction = PredictionService::new(detector, annotator, labels, config.yolo_params())
        .with_format(config.format);
    if let Some(dir) = &config.save_dir {
        let store = DirImageStore::create(dir).await?;
        tracing::info!("💾 Annotated images will be kept in {}", store.root().display());
        prediction = prediction.with_store(Arc::new(store));
    }

    // 4. HTTP
    let state = HttpState { prediction: Arc::new(prediction) };
    let app = router(state, config.max_upload_bytes());

    tracing::info!("🚀 Detection API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
