//! Emotion/language → seed genre lookup

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, AppState};

/// POST /mapping request
///
/// A missing field reads as empty and fails the lookup like any unknown value.
#[derive(Debug, Deserialize)]
pub struct MappingRequest {
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub language: String,
}

/// POST /mapping response
#[derive(Debug, Serialize)]
pub struct MappingResponse {
    pub seeds: Vec<String>,
}

/// POST /mapping
///
/// 400 `{ "error": "Invalid emotion/language mapping" }` when either value is unknown.
pub async fn map_genres(
    State(state): State<AppState>,
    payload: Result<Json<MappingRequest>, JsonRejection>,
) -> ApiResult<Json<MappingResponse>> {
    let Json(request) = payload?;
    let seeds = state.mapper.map(&request.emotion, &request.language)?;
    Ok(Json(MappingResponse {
        seeds: seeds.as_slice().to_vec(),
    }))
}

pub fn mapping_routes() -> Router<AppState> {
    Router::new().route("/mapping", post(map_genres))
}
