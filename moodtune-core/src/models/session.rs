//! Analysis session state machine
//!
//! Idle → Analyzing → {Ready, Failed}; Ready/Failed → Analyzing on the next submission.
//! The session is owned by the orchestrator; everyone else reads a `SessionSnapshot`.

use chrono::{DateTime, Utc};
use moodtune_common::events::{AnalysisPhase, ThemeState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Language, Track};
use crate::services::detection_client::DetectionResult;
use crate::services::genre_mapper::GenreSeedSet;

/// Non-error outcome worth telling the user about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Advisory {
    /// Recommender answered successfully but had nothing for this emotion/language
    NoTracksFound,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::NoTracksFound => {
                "No songs found for this emotion and language. Try another one!"
            }
        }
    }
}

/// Failure attached to a Failed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFailure {
    /// Stage that produced the error
    pub stage: String,
    /// User-facing message
    pub message: String,
}

/// Phase transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_phase: AnalysisPhase,
    pub new_phase: AnalysisPhase,
    pub transitioned_at: DateTime<Utc>,
}

/// Session state (in-memory, exclusively owned by the orchestrator)
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub phase: AnalysisPhase,
    /// Number of analyses accepted so far
    pub attempt: u64,
    pub language: Option<Language>,
    pub detection: Option<DetectionResult>,
    pub seeds: Option<GenreSeedSet>,
    pub tracks: Vec<Track>,
    pub theme: ThemeState,
    pub advisory: Option<Advisory>,
    pub failure: Option<SessionFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            phase: AnalysisPhase::Idle,
            attempt: 0,
            language: None,
            detection: None,
            seeds: None,
            tracks: Vec::new(),
            theme: ThemeState::Default,
            advisory: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to new phase
    pub fn transition_to(&mut self, new_phase: AnalysisPhase) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_phase: self.phase,
            new_phase,
            transitioned_at: Utc::now(),
        };
        self.phase = new_phase;
        self.updated_at = transition.transitioned_at;
        transition
    }

    /// Enter Analyzing: bump the attempt and clear everything the previous run produced
    pub fn begin_analysis(&mut self, language: Language) -> StateTransition {
        self.attempt += 1;
        self.language = Some(language);
        self.detection = None;
        self.seeds = None;
        self.tracks.clear();
        self.advisory = None;
        self.failure = None;
        self.transition_to(AnalysisPhase::Analyzing)
    }

    pub fn is_analyzing(&self) -> bool {
        self.phase == AnalysisPhase::Analyzing
    }

    /// Read-only copy for the presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            state: self.phase,
            attempt: self.attempt,
            language: self.language.map(|l| l.code().to_string()),
            emotion: self.detection.as_ref().map(|d| d.emotion.clone()),
            confidence: self.detection.as_ref().and_then(|d| d.confidence),
            confidence_percent: self
                .detection
                .as_ref()
                .and_then(|d| d.confidence_percent()),
            seeds: self
                .seeds
                .as_ref()
                .map(|s| s.as_slice().to_vec())
                .unwrap_or_default(),
            tracks: self.tracks.clone(),
            theme: self.theme,
            advisory: self.advisory.map(|a| a.message().to_string()),
            error: self.failure.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: AnalysisPhase,
    pub attempt: u64,
    pub language: Option<String>,
    pub emotion: Option<String>,
    pub confidence: Option<f64>,
    /// Confidence formatted for display ("87.5%")
    pub confidence_percent: Option<String>,
    pub seeds: Vec<String>,
    pub tracks: Vec<Track>,
    pub theme: ThemeState,
    pub advisory: Option<String>,
    pub error: Option<SessionFailure>,
    pub updated_at: DateTime<Utc>,
}
