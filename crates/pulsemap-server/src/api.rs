//! REST handlers: snapshot and ingestion.

use crate::AppState;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use pulsemap_types::TrackerSnapshot;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Handler for `GET /api/snapshot`.
///
/// Returns the current live state, the same shape observers receive in their
/// hydration message.
pub async fn snapshot_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<TrackerSnapshot> {
    Json(state.tracker.snapshot())
}

/// One reported occurrence.
#[derive(Debug, Deserialize)]
pub struct ObserveRequest {
    /// The origin the occurrence is attributed to.
    pub origin: String,
}

/// Handler for `POST /api/observe`.
///
/// The ingestion hook for real feeds. Any identifier is accepted and the
/// call never fails; enrichment problems degrade to placeholder attributes
/// inside the tracker.
pub async fn observe_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<ObserveRequest>,
) -> impl IntoResponse {
    state.tracker.observe(&request.origin);
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "accepted": true,
            "total": state.tracker.total(),
        })),
    )
}
