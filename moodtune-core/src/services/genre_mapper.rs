//! Emotion + language → seed genres
//!
//! The table is an exhaustive `match` over both closed vocabularies, so a missing
//! (emotion, language) pair is a compile error rather than a runtime lookup miss.
//! Raw labels are normalized (trimmed, case-folded) before lookup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Emotion, Language};

/// Genre mapping errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Unknown emotion: {0}")]
    UnknownEmotion(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

/// Ordered, non-empty, duplicate-free list of seed genres
///
/// Only produced by `GenreMapper`; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreSeedSet(Vec<String>);

impl GenreSeedSet {
    fn from_static(genres: &[&'static str]) -> Self {
        let mut seeds: Vec<String> = Vec::with_capacity(genres.len());
        for genre in genres {
            if !seeds.iter().any(|s| s == genre) {
                seeds.push((*genre).to_string());
            }
        }
        debug_assert!(!seeds.is_empty(), "seed table rows are never empty");
        Self(seeds)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined, order-preserving ("telugu,pop")
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

/// Maps a detected emotion and chosen language to seed genres
///
/// Pure and deterministic: no I/O, no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenreMapper;

impl GenreMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map raw emotion/language strings to a seed set
    ///
    /// The emotion is validated first, so a pair that is wrong on both axes reports
    /// `UnknownEmotion`.
    pub fn map(&self, emotion: &str, language: &str) -> Result<GenreSeedSet, MappingError> {
        let emotion_value = Emotion::parse(emotion).ok_or_else(|| {
            tracing::warn!(emotion = %emotion, "Unknown emotion - no genre mapping available");
            MappingError::UnknownEmotion(emotion.to_string())
        })?;
        let language_value = Language::parse(language).ok_or_else(|| {
            tracing::warn!(language = %language, "Unknown language - no genre mapping available");
            MappingError::UnknownLanguage(language.to_string())
        })?;

        Ok(self.map_known(emotion_value, language_value))
    }

    /// Map already-validated values; total over both vocabularies
    pub fn map_known(&self, emotion: Emotion, language: Language) -> GenreSeedSet {
        let seeds = GenreSeedSet::from_static(Self::table(emotion, language));
        tracing::debug!(
            emotion = %emotion,
            language = %language,
            seeds = %seeds.joined(),
            "Mapped emotion to seed genres"
        );
        seeds
    }

    /// Seed table: regional languages lead with their own genre tag
    fn table(emotion: Emotion, language: Language) -> &'static [&'static str] {
        use Emotion::*;
        use Language::*;

        match (emotion, language) {
            (Angry, Telugu) => &["telugu", "rock", "metal"],
            (Angry, Tamil) => &["tamil", "rock"],
            (Angry, Hindi) => &["hindi", "rock"],
            (Angry, English) => &["rock", "metal"],

            (Sad, Telugu) => &["telugu", "blues"],
            (Sad, Tamil) => &["tamil", "blues"],
            (Sad, Hindi) => &["hindi", "blues"],
            (Sad, English) => &["blues"],

            (Fear, Telugu) => &["telugu", "ambient"],
            (Fear, Tamil) => &["tamil", "ambient"],
            (Fear, Hindi) => &["hindi", "ambient"],
            (Fear, English) => &["ambient"],

            (Happy, Telugu) => &["telugu", "pop"],
            (Happy, Tamil) => &["tamil", "pop"],
            (Happy, Hindi) => &["hindi", "pop"],
            (Happy, English) => &["pop"],

            (Neutral, Telugu) => &["telugu", "acoustic"],
            (Neutral, Tamil) => &["tamil", "acoustic"],
            (Neutral, Hindi) => &["hindi", "acoustic"],
            (Neutral, English) => &["acoustic"],

            (Surprise, Telugu) => &["telugu", "party"],
            (Surprise, Tamil) => &["tamil", "party"],
            (Surprise, Hindi) => &["hindi", "party"],
            (Surprise, English) => &["party"],

            (Disgust, Telugu) => &["telugu", "alt-rock"],
            (Disgust, Tamil) => &["tamil", "alt-rock"],
            (Disgust, Hindi) => &["hindi", "alt-rock"],
            (Disgust, English) => &["alt-rock"],
        }
    }
}
