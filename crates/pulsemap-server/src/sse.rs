//! SSE observer stream handler.

use crate::AppState;
use axum::{
    extract::Extension,
    response::{sse::Event, sse::KeepAlive, Sse},
};
use futures_util::Stream;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

/// Handler for `GET /events/stream`.
///
/// Attaches the client as a tracker observer and streams its events,
/// hydration first. When the client goes away the receiver drops and the
/// tracker prunes the observer on its next publish.
pub async fn event_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.tracker.attach().into_receiver();

    let stream = ReceiverStream::new(receiver).filter_map(|event| {
        match serde_json::to_string(&event) {
            Ok(data) => Some(Ok(Event::default().data(data))),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize tracker event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
