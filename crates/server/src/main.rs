use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use slipscan_ocr::{OcrEngine, ReceiptPipeline};

mod config;
mod error;
mod handlers;

use config::ServerConfig;
use handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = ServerConfig::load()?;
    std::fs::create_dir_all(&cfg.data_dir)?;
    let uploads_dir = cfg.data_dir.join("uploads");
    std::fs::create_dir_all(&uploads_dir)?;

    let db = slipscan_storage::create_db(&cfg.data_dir.join("receipts.db")).await?;

    let pipeline = Arc::new(ReceiptPipeline::new(build_engine(&cfg), uploads_dir));
    let state = Arc::new(AppState { db, pipeline });
    let app = router(state, cfg.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/receipts",
            post(handlers::upload_receipt).get(handlers::list_receipts),
        )
        .route("/api/receipts/batch", post(handlers::upload_batch))
        .route("/api/receipts/export.csv", get(handlers::export_csv))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

#[cfg(feature = "tesseract")]
fn build_engine(cfg: &ServerConfig) -> Box<dyn OcrEngine> {
    Box::new(slipscan_ocr::recognizer::tesseract::TesseractEngine::new(
        None,
        &cfg.ocr_lang,
    ))
}

#[cfg(not(feature = "tesseract"))]
fn build_engine(_cfg: &ServerConfig) -> Box<dyn OcrEngine> {
    tracing::warn!("built without the `tesseract` feature — uploads will be rejected");
    Box::new(slipscan_ocr::NullEngine)
}
