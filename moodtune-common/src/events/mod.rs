//! Event types for the MoodTune event system
//!
//! Provides shared event definitions and EventBus. The presentation layer never reads
//! process-wide state; it subscribes here (directly or through SSE).

mod presentation_types;

pub use presentation_types::{AnalysisPhase, Tempo, ThemeState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// MoodTune event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MoodEvent {
    /// An analysis was accepted and is now in flight
    AnalysisStarted {
        /// Session the analysis belongs to
        session_id: Uuid,
        /// Analysis attempt number within the session (1-based)
        attempt: u64,
        /// Requested language (full name)
        language: String,
        timestamp: DateTime<Utc>,
    },

    /// Emotion classifier answered
    EmotionDetected {
        session_id: Uuid,
        attempt: u64,
        /// Raw label as normalized by the detection client
        emotion: String,
        /// Classifier confidence (0.0-1.0), if it gave a usable one
        confidence: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// Analysis reached the Ready phase
    ///
    /// `advisory` is set when the recommender succeeded with zero tracks.
    AnalysisCompleted {
        session_id: Uuid,
        attempt: u64,
        emotion: String,
        seeds: Vec<String>,
        track_count: usize,
        advisory: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Analysis reached the Failed phase
    AnalysisFailed {
        session_id: Uuid,
        attempt: u64,
        /// Pipeline stage that failed ("detection", "mapping", ...)
        stage: String,
        /// User-facing message
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Ambient theme changed
    ThemeChanged {
        old_theme: ThemeState,
        new_theme: ThemeState,
        timestamp: DateTime<Utc>,
    },

    /// One beat of the tempo generator
    TempoTick {
        /// Generator run that produced this tick
        generation: u64,
        /// Sampled energy (0.0-1.0)
        energy: f64,
        tempo: Tempo,
        /// Pulse length for `tempo`, in milliseconds
        pulse_ms: u64,
        theme: ThemeState,
        timestamp: DateTime<Utc>,
    },

    /// Tempo generator went idle
    TempoStopped {
        generation: u64,
        timestamp: DateTime<Utc>,
    },
}

impl MoodEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            MoodEvent::AnalysisStarted { .. } => "AnalysisStarted",
            MoodEvent::EmotionDetected { .. } => "EmotionDetected",
            MoodEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            MoodEvent::AnalysisFailed { .. } => "AnalysisFailed",
            MoodEvent::ThemeChanged { .. } => "ThemeChanged",
            MoodEvent::TempoTick { .. } => "TempoTick",
            MoodEvent::TempoStopped { .. } => "TempoStopped",
        }
    }

    /// True for events produced by the theme engine (theme + tempo)
    pub fn is_presentation(&self) -> bool {
        matches!(
            self,
            MoodEvent::ThemeChanged { .. }
                | MoodEvent::TempoTick { .. }
                | MoodEvent::TempoStopped { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use moodtune_common::events::{EventBus, MoodEvent, ThemeState};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MoodEvent::ThemeChanged {
///     old_theme: ThemeState::Default,
///     new_theme: ThemeState::Happy,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(MoodEvent::ThemeChanged { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MoodEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MoodEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MoodEvent) {
        let _ = self.tx.send(event);
    }
}
