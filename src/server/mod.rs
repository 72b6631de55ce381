//! Web server exposing the PII pipeline.
//!
//! Routes:
//! - `GET /health` - liveness check
//! - `POST /detect` - multipart upload, responds with detected PII spans
//! - `POST /redact` - multipart upload, responds with a redacted text file

mod handlers;
mod routes;

pub use handlers::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::engine::Engines;
use crate::ocr::TextExtractor;
use crate::pii::PiiPipeline;

/// Shared state for the web server.
///
/// Everything here is an immutable handle; requests share no mutable
/// state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PiiPipeline,
    pub extractor: Arc<TextExtractor>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Build state from settings with the configured engines.
    pub fn new(settings: &Settings) -> Self {
        Self::with_engines(settings, Engines::from_settings(settings))
    }

    /// Build state with explicit engine handles.
    pub fn with_engines(settings: &Settings, engines: Engines) -> Self {
        Self {
            pipeline: PiiPipeline::new(engines.analyzer, engines.anonymizer, &settings.language),
            extractor: Arc::new(TextExtractor::new(&settings.ocr_language)),
            settings: Arc::new(settings.clone()),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
