//! Session orchestrator
//!
//! Owns the single `Session` and runs one analysis at a time:
//! detect → map → recommend → theme. A second `analyze` while one is in flight is
//! rejected, never queued.
//!
//! The session lock is only held for short synchronous sections (phase changes and
//! commits); it is released across the detector and recommender calls so snapshots
//! stay readable while an analysis is pending.

use chrono::Utc;
use moodtune_common::events::{AnalysisPhase, EventBus, MoodEvent};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Advisory, Language, Session, SessionFailure, SessionSnapshot};
use crate::services::capture::{CaptureDevice, CaptureError, CaptureGuard};
use crate::services::detection_client::{DetectionError, EmotionDetector, ImageSource};
use crate::services::genre_mapper::{GenreMapper, MappingError};
use crate::services::recommendation_client::{RecommendationError, TrackRecommender};
use crate::services::theme_engine::ThemeEngine;

const REQUEST_ERROR_PREFIX: &str = "Error processing your request";
const CANCELLED_STAGE: &str = "cancelled";
const CANCELLED_MESSAGE: &str = "Analysis was cancelled";

/// Analysis pipeline errors, tagged with the stage that raised them
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mapping failed: {0}")]
    Mapping(#[from] MappingError),

    #[error("Detection failed: {0}")]
    Detection(DetectionError),

    #[error("Recommendation failed: {0}")]
    Recommendation(#[from] RecommendationError),

    #[error("An analysis is already in progress")]
    Concurrency,

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
}

impl From<DetectionError> for AnalysisError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::InvalidInput(msg) => AnalysisError::InvalidInput(msg),
            other => AnalysisError::Detection(other),
        }
    }
}

impl AnalysisError {
    pub fn stage(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "input",
            AnalysisError::Mapping(_) => "mapping",
            AnalysisError::Detection(_) => "detection",
            AnalysisError::Recommendation(_) => "recommendation",
            AnalysisError::Concurrency => "concurrency",
            AnalysisError::Capture(_) => "capture",
        }
    }

    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::InvalidInput(msg) => msg.clone(),
            AnalysisError::Mapping(_) => {
                format!("{}: Invalid emotion/language mapping", REQUEST_ERROR_PREFIX)
            }
            AnalysisError::Detection(err) => {
                let detail = match err {
                    DetectionError::Upstream { message, .. } => message.clone(),
                    DetectionError::Timeout => "Emotion detector timed out".to_string(),
                    _ => "Could not reach the emotion detector".to_string(),
                };
                format!("{}: {}", REQUEST_ERROR_PREFIX, detail)
            }
            AnalysisError::Recommendation(err) => {
                let detail = match err {
                    RecommendationError::Upstream { message, .. } => message.clone(),
                    _ => "Failed to fetch recommendations".to_string(),
                };
                format!("{}: {}", REQUEST_ERROR_PREFIX, detail)
            }
            AnalysisError::Concurrency => {
                "An analysis is already running. Please wait for it to finish.".to_string()
            }
            AnalysisError::Capture(err) => match err {
                CaptureError::DeviceUnavailable(msg) | CaptureError::FrameUnavailable(msg) => {
                    format!("Camera error: {}", msg)
                }
            },
        }
    }
}

/// Marks the session Failed if an analysis is abandoned before it commits
///
/// Covers the caller dropping the `analyze` future mid-flight.
struct InFlight<'a> {
    orchestrator: &'a SessionOrchestrator,
    attempt: u64,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let session_id = {
            let mut session = self.orchestrator.lock_session();
            if session.attempt != self.attempt || !session.is_analyzing() {
                return;
            }
            session.failure = Some(SessionFailure {
                stage: CANCELLED_STAGE.to_string(),
                message: CANCELLED_MESSAGE.to_string(),
            });
            session.transition_to(AnalysisPhase::Failed);
            session.session_id
        };

        tracing::warn!(
            session_id = %session_id,
            attempt = self.attempt,
            "Analysis abandoned before completion"
        );
        self.orchestrator.event_bus.emit_lossy(MoodEvent::AnalysisFailed {
            session_id,
            attempt: self.attempt,
            stage: CANCELLED_STAGE.to_string(),
            message: CANCELLED_MESSAGE.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Top-level coordinator for the analysis pipeline
pub struct SessionOrchestrator {
    session: Mutex<Session>,
    detector: Arc<dyn EmotionDetector>,
    recommender: Arc<dyn TrackRecommender>,
    mapper: GenreMapper,
    theme: ThemeEngine,
    event_bus: EventBus,
    track_limit: u32,
}

impl SessionOrchestrator {
    pub fn new(
        detector: Arc<dyn EmotionDetector>,
        recommender: Arc<dyn TrackRecommender>,
        event_bus: EventBus,
        track_limit: u32,
    ) -> Self {
        Self {
            session: Mutex::new(Session::new()),
            detector,
            recommender,
            mapper: GenreMapper::new(),
            theme: ThemeEngine::new(event_bus.clone()),
            event_bus,
            track_limit,
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Read-only copy of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_session().snapshot()
    }

    pub fn is_analyzing(&self) -> bool {
        self.lock_session().is_analyzing()
    }

    pub fn theme_engine(&self) -> &ThemeEngine {
        &self.theme
    }

    /// Run one full analysis
    ///
    /// Returns the Ready snapshot. A recommender that answers with zero tracks is still
    /// success; the snapshot carries `Advisory::NoTracksFound`.
    pub async fn analyze(
        &self,
        source: ImageSource,
        language: Language,
    ) -> Result<SessionSnapshot, AnalysisError> {
        source.validate()?;

        let (session_id, attempt) = {
            let mut session = self.lock_session();
            if session.is_analyzing() {
                tracing::warn!(
                    session_id = %session.session_id,
                    attempt = session.attempt,
                    "Rejecting analysis: one is already in flight"
                );
                return Err(AnalysisError::Concurrency);
            }
            session.begin_analysis(language);
            (session.session_id, session.attempt)
        };
        let in_flight = InFlight {
            orchestrator: self,
            attempt,
            finished: false,
        };

        self.theme.on_tracks_cleared();
        tracing::info!(
            session_id = %session_id,
            attempt,
            language = %language,
            source = source.kind(),
            "Analysis started"
        );
        self.event_bus.emit_lossy(MoodEvent::AnalysisStarted {
            session_id,
            attempt,
            language: language.name().to_string(),
            timestamp: Utc::now(),
        });

        let result = self.run_pipeline(session_id, attempt, source, language).await;
        in_flight.finish();

        match result {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                self.fail(session_id, attempt, &err);
                Err(err)
            }
        }
    }

    /// Grab a frame from `device` and analyze it
    ///
    /// The device is released before any network call, and on every error path.
    pub async fn analyze_capture(
        &self,
        device: Arc<dyn CaptureDevice>,
        language: Language,
    ) -> Result<SessionSnapshot, AnalysisError> {
        if self.is_analyzing() {
            return Err(AnalysisError::Concurrency);
        }

        let frame = {
            let guard = CaptureGuard::acquire(device).await?;
            let frame = guard.grab_frame().await;
            guard.release();
            frame?
        };

        self.analyze(ImageSource::DataUrl(frame), language).await
    }

    async fn run_pipeline(
        &self,
        session_id: Uuid,
        attempt: u64,
        source: ImageSource,
        language: Language,
    ) -> Result<SessionSnapshot, AnalysisError> {
        // Stage 1: detection
        let detection = self.detector.detect(source).await?;
        self.event_bus.emit_lossy(MoodEvent::EmotionDetected {
            session_id,
            attempt,
            emotion: detection.emotion.clone(),
            confidence: detection.confidence,
            timestamp: Utc::now(),
        });
        self.theme.on_detection(&detection);
        {
            let mut session = self.lock_session();
            session.detection = Some(detection.clone());
            session.theme = self.theme.theme();
        }

        // Stage 2: mapping
        let seeds = self.mapper.map(&detection.emotion, language.name())?;
        self.lock_session().seeds = Some(seeds.clone());

        // Stage 3: recommendation
        let tracks = self
            .recommender
            .recommend(seeds.as_slice(), self.track_limit, language.market())
            .await?;

        // Stage 4: theme (fallback needs the track list)
        let (theme, _) = self.theme.on_tracks(Some(&detection), &tracks);

        let advisory = tracks.is_empty().then_some(Advisory::NoTracksFound);
        let track_count = tracks.len();
        let snapshot = {
            let mut session = self.lock_session();
            session.tracks = tracks;
            session.theme = theme;
            session.advisory = advisory;
            session.transition_to(AnalysisPhase::Ready);
            session.snapshot()
        };

        if advisory.is_some() {
            tracing::info!(
                session_id = %session_id,
                emotion = %detection.emotion,
                seeds = %seeds.joined(),
                "Recommender returned no tracks"
            );
        } else {
            tracing::info!(
                session_id = %session_id,
                emotion = %detection.emotion,
                seeds = %seeds.joined(),
                tracks = track_count,
                theme = %theme,
                "Analysis completed"
            );
        }

        self.event_bus.emit_lossy(MoodEvent::AnalysisCompleted {
            session_id,
            attempt,
            emotion: detection.emotion,
            seeds: seeds.as_slice().to_vec(),
            track_count,
            advisory: advisory.map(|a| a.message().to_string()),
            timestamp: Utc::now(),
        });

        Ok(snapshot)
    }

    fn fail(&self, session_id: Uuid, attempt: u64, err: &AnalysisError) {
        self.theme.on_tracks_cleared();
        let message = err.user_message();
        {
            let mut session = self.lock_session();
            session.failure = Some(SessionFailure {
                stage: err.stage().to_string(),
                message: message.clone(),
            });
            session.theme = self.theme.theme();
            session.transition_to(AnalysisPhase::Failed);
        }

        tracing::error!(
            session_id = %session_id,
            attempt,
            stage = err.stage(),
            error = %err,
            "Analysis failed"
        );
        self.event_bus.emit_lossy(MoodEvent::AnalysisFailed {
            session_id,
            attempt,
            stage: err.stage().to_string(),
            message,
            timestamp: Utc::now(),
        });
    }

    /// Stop background presentation work; call when the service shuts down
    pub fn shutdown(&self) {
        self.theme.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_input_errors_become_invalid_input() {
        let err: AnalysisError = DetectionError::InvalidInput("no image".into()).into();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
        assert_eq!(err.stage(), "input");
        assert_eq!(err.user_message(), "no image");
    }

    #[test]
    fn test_upstream_message_is_surfaced() {
        let err: AnalysisError = DetectionError::Upstream {
            status: 400,
            message: "No image data".into(),
        }
        .into();
        assert_eq!(err.stage(), "detection");
        assert_eq!(
            err.user_message(),
            "Error processing your request: No image data"
        );
    }

    #[test]
    fn test_mapping_message() {
        let err = AnalysisError::from(MappingError::UnknownEmotion("Unknown".into()));
        assert_eq!(err.stage(), "mapping");
        assert!(err.user_message().ends_with("Invalid emotion/language mapping"));
    }

    #[test]
    fn test_capture_message() {
        let err = AnalysisError::from(CaptureError::DeviceUnavailable("Permission denied".into()));
        assert_eq!(err.user_message(), "Camera error: Permission denied");
    }
}
