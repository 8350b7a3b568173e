//! moodtune-core library interface
//!
//! Exposes the analysis pipeline and the HTTP router for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use moodtune_common::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ConfiguredToken, ServiceConfig};
use crate::services::{
    DetectionClient, EmotionDetector, GenreMapper, RecommendationClient, SessionOrchestrator,
    TrackRecommender,
};

/// Event bus capacity; tempo ticks are frequent, so leave room for slow SSE clients
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Owner of the single analysis session
    pub orchestrator: Arc<SessionOrchestrator>,
    /// Used directly by the stateless recommendation route
    pub recommender: Arc<dyn TrackRecommender>,
    pub mapper: GenreMapper,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Track limit when a request does not give one
    pub default_limit: u32,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        detector: Arc<dyn EmotionDetector>,
        recommender: Arc<dyn TrackRecommender>,
        event_bus: EventBus,
        default_limit: u32,
    ) -> Self {
        let orchestrator = Arc::new(SessionOrchestrator::new(
            detector,
            Arc::clone(&recommender),
            event_bus.clone(),
            default_limit,
        ));
        Self {
            orchestrator,
            recommender,
            mapper: GenreMapper::new(),
            event_bus,
            default_limit,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Build the HTTP clients described by `config`
    pub fn from_config(config: &ServiceConfig, event_bus: EventBus) -> moodtune_common::Result<Self> {
        let detector = DetectionClient::new(config.detector_url.clone(), config.request_timeout)
            .map_err(|e| moodtune_common::Error::Internal(e.to_string()))?;
        let tokens = Arc::new(ConfiguredToken::new(config.recommender_token.clone()));
        let recommender = RecommendationClient::new(
            config.recommender_url.clone(),
            tokens,
            config.request_timeout,
        )
        .map_err(|e| moodtune_common::Error::Internal(e.to_string()))?;

        Ok(Self::new(
            Arc::new(detector),
            Arc::new(recommender),
            event_bus,
            config.default_limit,
        ))
    }

    /// Remember the most recent failure for /health
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::session_routes())
        .merge(api::recommendation_routes())
        .merge(api::mapping_routes())
        .merge(api::health_routes())
        .merge(api::event_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
