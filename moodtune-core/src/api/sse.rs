//! Server-Sent Events for the presentation channel
//!
//! Streams analysis progress, theme changes and tempo ticks.

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;

use crate::AppState;

/// GET /events query
#[derive(Debug, Default, Deserialize)]
pub struct EventStreamQuery {
    /// Only theme and tempo events
    #[serde(default)]
    pub presentation_only: bool,
}

/// GET /events - SSE event stream
///
/// Streams events:
/// - AnalysisStarted, EmotionDetected, AnalysisCompleted, AnalysisFailed
/// - ThemeChanged, TempoTick, TempoStopped
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let presentation_only = query.presentation_only;
    moodtune_common::sse::create_event_sse_stream(&state.event_bus, "moodtune-core", move |event| {
        !presentation_only || event.is_presentation()
    })
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
