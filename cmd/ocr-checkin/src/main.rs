//! # ocr-checkin
//!
//! The entry point that assembles the check-in server from its adapters.

use anyhow::Context;
use api_adapters::{router, AppState, Metrics, RouterOptions};
use configs::{LogSettings, Settings};
use ocr_adapters::GoogleVisionOcr;
use services::SubmissionService;
use std::net::SocketAddr;
use std::sync::Arc;
use storage_adapters::FileSubmissionStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = fmt().with_env_filter(filter).with_target(false);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Settings {
        server,
        storage,
        upload,
        ocr,
        log,
    } = Settings::load().context("loading configuration")?;
    init_tracing(&log);
    if !ocr.has_api_key() {
        warn!("ocr.api_key is empty; the OCR provider will reject every upload");
    }

    // 1. Storage: the log file is the only durable state
    let store = Arc::new(FileSubmissionStore::new(storage.path));
    info!(path = %store.path().display(), "submission log");

    // 2. OCR provider
    let ocr_timeout = ocr.timeout();
    let provider = Arc::new(GoogleVisionOcr::new(ocr.endpoint, ocr.api_key));

    // 3. Service + HTTP surface
    let service = Arc::new(SubmissionService::new(store, provider, ocr_timeout));
    let state = AppState {
        service,
        metrics: Arc::new(Metrics::new()),
    };
    let static_dir = storage.static_dir;
    let app = router(
        state,
        RouterOptions {
            max_upload_bytes: upload.max_bytes,
            static_dir: static_dir.is_dir().then_some(static_dir),
        },
    );

    let addr = server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("OCR check-in server listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving HTTP")?;

    Ok(())
}
