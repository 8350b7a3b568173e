//! Session snapshot endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::{models::SessionSnapshot, AppState};

/// GET /session
///
/// Read-only view; never blocks on an in-flight analysis.
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.orchestrator.snapshot())
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/session", get(get_session))
}
