//! Stateless recommendation lookups
//!
//! These do not touch the analysis session: GenreMapper + RecommendationClient only.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::MAX_TRACK_LIMIT,
    error::{ApiError, ApiResult},
    models::{Language, Track},
    AppState,
};

/// GET /recommendations query
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<u32>,
}

/// GET /recommendations response
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub tracks: Vec<Track>,
}

/// POST /api/recommend request
///
/// Missing fields read as empty and are reported as an invalid mapping.
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub language: String,
}

async fn lookup(
    state: &AppState,
    emotion: &str,
    language: &str,
    limit: u32,
) -> ApiResult<Vec<Track>> {
    let seeds = state.mapper.map(emotion, language)?;
    // map() succeeded, so the language parses
    let market = Language::parse(language)
        .map(|l| l.market())
        .unwrap_or_else(|| Language::English.market());

    match state.recommender.recommend(seeds.as_slice(), limit, market).await {
        Ok(tracks) => Ok(tracks),
        Err(e) => {
            tracing::error!(emotion = %emotion, language = %language, error = %e, "Recommendation lookup failed");
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// GET /recommendations/:emotion/:language
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path((emotion, language)): Path<(String, String)>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> ApiResult<Json<RecommendationResponse>> {
    let Query(query) = query?;
    let limit = match query.limit {
        None => state.default_limit,
        Some(limit) if (1..=MAX_TRACK_LIMIT).contains(&limit) => limit,
        Some(limit) => {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}, got {}",
                MAX_TRACK_LIMIT, limit
            )))
        }
    };

    let tracks = lookup(&state, &emotion, &language, limit).await?;
    Ok(Json(RecommendationResponse { tracks }))
}

/// POST /api/recommend
///
/// Same lookup, answered with a bare track array.
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Track>>> {
    let Json(request) = payload?;
    let tracks = lookup(&state, &request.emotion, &request.language, state.default_limit).await?;
    Ok(Json(tracks))
}

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations/:emotion/:language", get(get_recommendations))
        .route("/api/recommend", post(recommend))
}
