use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use services::SubmissionService;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::metrics::Metrics;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SubmissionService>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Largest accepted request body on `/upload`
    pub max_upload_bytes: usize,
    /// Served for every unmatched path (submit page, dashboard)
    pub static_dir: Option<PathBuf>,
}

/// Builds the full application router.
pub fn router(state: AppState, options: RouterOptions) -> Router {
    let api = Router::new()
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(options.max_upload_bytes)),
        )
        .route("/list", get(handlers::list))
        .route("/list/{name}", delete(handlers::delete))
        .route("/download", get(handlers::download))
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(|| async { "OK" }))
        .with_state(state);

    let app = match options.static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
