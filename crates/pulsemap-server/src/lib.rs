//! Pulsemap server library logic.

pub mod api;
pub mod config;
pub mod feed;
pub mod sse;
pub mod ws;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use pulsemap_geo::GeoResolver;
use pulsemap_tracker::OriginTracker;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The live origin tracker.
    pub tracker: OriginTracker,
    /// Geo enrichment resolver, exposed for readiness reporting.
    pub geo: GeoResolver,
    /// Directory with the map frontend, empty when static serving is off.
    pub static_dir: String,
}

/// Maximum request body size (64 KiB). The only write endpoint accepts a
/// single origin identifier, so anything larger is garbage.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "geoReady": state.geo.is_ready(),
        "origins": state.tracker.origin_count(),
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/snapshot", get(api::snapshot_handler))
        .route("/api/observe", post(api::observe_handler))
        .route("/events/stream", get(sse::event_stream_handler))
        .route("/ws", get(ws::ws_handler));

    // Serve the map frontend if a static directory is configured.
    let router = if state.static_dir.is_empty() {
        router
    } else if std::path::Path::new(&state.static_dir)
        .join("index.html")
        .exists()
    {
        tracing::info!(path = %state.static_dir, "serving map frontend");
        let index = format!("{}/index.html", state.static_dir);
        router.fallback_service(ServeDir::new(&state.static_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::warn!(
            path = %state.static_dir,
            "static directory has no index.html, skipping frontend serving"
        );
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
