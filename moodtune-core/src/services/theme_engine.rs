//! Ambient presentation theme derivation
//!
//! Purely advisory: nothing here returns an error. Malformed or absent input degrades
//! to `ThemeState::Neutral` / `ThemeState::Default`.
//!
//! **Primary derivation:** the detected label is matched case-insensitively against a
//! synonym table ("joy" and "excited" count as happy).
//!
//! **Fallback derivation:** when the label does not resolve, the title and artist text
//! of the first few tracks is scanned for keyword families in the fixed priority
//! happy → sad → angry → calm. This is a best-effort hint; a sad song called
//! "Happy Birthday" will still read as happy.
//!
//! The engine owns the tempo generator and publishes `ThemeChanged` on the event bus.

use chrono::Utc;
use moodtune_common::events::{EventBus, MoodEvent, ThemeState};
use std::sync::Mutex;

use crate::models::Track;
use crate::services::detection_client::DetectionResult;
use crate::services::tempo::{TempoGenerator, TempoHandle, TempoState};

/// Number of leading tracks inspected by the keyword fallback
pub const FALLBACK_TRACK_WINDOW: usize = 5;

const SYNONYMS: &[(ThemeState, &[&str])] = &[
    (
        ThemeState::Happy,
        &["happy", "happiness", "joy", "joyful", "excited", "cheerful", "delighted"],
    ),
    (
        ThemeState::Sad,
        &["sad", "sadness", "sorrow", "unhappy", "melancholy", "depressed"],
    ),
    (
        ThemeState::Angry,
        &["angry", "anger", "furious", "mad", "rage", "disgust", "disgusted"],
    ),
    (
        ThemeState::Fear,
        &["fear", "scared", "afraid", "anxious", "fearful"],
    ),
    (
        ThemeState::Surprised,
        &["surprise", "surprised", "amazed", "astonished", "shocked"],
    ),
    (
        ThemeState::Calm,
        &["calm", "relaxed", "peaceful", "serene", "content"],
    ),
    (ThemeState::Neutral, &["neutral"]),
];

/// Keyword families in priority order
const KEYWORD_FAMILIES: &[(ThemeState, &[&str])] = &[
    (
        ThemeState::Happy,
        &["party", "dance", "celebrate", "happy", "joy", "fun", "sunshine", "groove"],
    ),
    (
        ThemeState::Sad,
        &["sad", "cry", "tears", "lonely", "heartbreak", "blue", "miss"],
    ),
    (
        ThemeState::Angry,
        &["rage", "fight", "angry", "scream", "fire", "war", "metal"],
    ),
    (
        ThemeState::Calm,
        &["calm", "peace", "sleep", "dream", "chill", "relax", "quiet"],
    ),
];

/// Resolve a raw emotion label through the synonym table
pub fn resolve_label(label: &str) -> Option<ThemeState> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    SYNONYMS
        .iter()
        .find(|(_, words)| words.contains(&label.as_str()))
        .map(|(theme, _)| *theme)
}

/// Keyword fallback over the first `FALLBACK_TRACK_WINDOW` tracks
///
/// Words are compared whole (a trailing "s" is tolerated), so "blues" counts as sad
/// but "warm" does not count as angry.
pub fn theme_from_tracks(tracks: &[Track]) -> ThemeState {
    let text = tracks
        .iter()
        .take(FALLBACK_TRACK_WINDOW)
        .map(Track::search_text)
        .collect::<Vec<_>>()
        .join(" ");

    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    KEYWORD_FAMILIES
        .iter()
        .find(|(_, keywords)| {
            words.iter().any(|word| {
                keywords
                    .iter()
                    .any(|kw| *word == *kw || word.strip_suffix('s') == Some(*kw))
            })
        })
        .map(|(theme, _)| *theme)
        .unwrap_or(ThemeState::Neutral)
}

/// Full derivation: detected label first, track keywords second
///
/// With neither a detection nor any tracks there is nothing to go on and the result is
/// `Default`.
pub fn derive_theme(detection: Option<&DetectionResult>, tracks: &[Track]) -> ThemeState {
    if let Some(theme) = detection.and_then(|d| resolve_label(&d.emotion)) {
        return theme;
    }
    if detection.is_none() && tracks.is_empty() {
        return ThemeState::Default;
    }
    theme_from_tracks(tracks)
}

/// Current theme plus the tempo generator that follows it
pub struct ThemeEngine {
    theme: Mutex<ThemeState>,
    tempo: TempoGenerator,
    event_bus: EventBus,
}

impl ThemeEngine {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            theme: Mutex::new(ThemeState::Default),
            tempo: TempoGenerator::new(event_bus.clone()),
            event_bus,
        }
    }

    pub fn theme(&self) -> ThemeState {
        *self.theme.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn tempo_state(&self) -> TempoState {
        self.tempo.state()
    }

    /// Primary derivation, run as soon as the detector answers
    ///
    /// Returns the new theme if the label resolved; otherwise the theme is left alone
    /// until tracks arrive.
    pub fn on_detection(&self, detection: &DetectionResult) -> Option<ThemeState> {
        let theme = resolve_label(&detection.emotion)?;
        self.set_theme(theme);
        Some(theme)
    }

    /// Full derivation once the track list is known; drives the tempo generator
    ///
    /// Ticking runs only while there are tracks.
    pub fn on_tracks(
        &self,
        detection: Option<&DetectionResult>,
        tracks: &[Track],
    ) -> (ThemeState, Option<TempoHandle>) {
        let theme = derive_theme(detection, tracks);
        self.set_theme(theme);

        if tracks.is_empty() {
            self.tempo.stop();
            (theme, None)
        } else {
            (theme, Some(self.tempo.start(theme)))
        }
    }

    /// Track list was cleared (new analysis or failure)
    pub fn on_tracks_cleared(&self) {
        self.tempo.stop();
    }

    /// Session is ending
    pub fn shutdown(&self) {
        if self.tempo.stop() {
            tracing::info!("Tempo generator stopped on shutdown");
        }
    }

    fn set_theme(&self, new_theme: ThemeState) {
        let old_theme = {
            let mut current = self.theme.lock().unwrap_or_else(|p| p.into_inner());
            std::mem::replace(&mut *current, new_theme)
        };
        if old_theme != new_theme {
            tracing::debug!(old = %old_theme, new = %new_theme, "Theme changed");
            self.event_bus.emit_lossy(MoodEvent::ThemeChanged {
                old_theme,
                new_theme,
                timestamp: Utc::now(),
            });
        }
    }
}
