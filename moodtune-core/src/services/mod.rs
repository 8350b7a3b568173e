//! Service modules for the analysis pipeline
//!
//! DetectionClient → GenreMapper → RecommendationClient → ThemeEngine, sequenced by
//! SessionOrchestrator.

pub mod capture;
pub mod detection_client;
pub mod genre_mapper;
pub mod recommendation_client;
pub mod session_orchestrator;
pub mod tempo;
pub mod theme_engine;

pub use capture::{CaptureDevice, CaptureError, CaptureGuard};
pub use detection_client::{
    DetectionClient, DetectionError, DetectionResult, EmotionDetector, ImageSource,
};
pub use genre_mapper::{GenreMapper, GenreSeedSet, MappingError};
pub use recommendation_client::{RecommendationClient, RecommendationError, TrackRecommender};
pub use session_orchestrator::{AnalysisError, SessionOrchestrator};
pub use tempo::{tempo_for_energy, TempoGenerator, TempoHandle, TempoState};
pub use theme_engine::{derive_theme, ThemeEngine};
