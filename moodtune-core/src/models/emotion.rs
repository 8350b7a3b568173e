//! Closed emotion and language vocabularies
//!
//! Emotion labels follow the classifier's canonical vocabulary. Languages are identified
//! interchangeably by two-letter code or full name; the mapping is total in both directions.

use serde::{Deserialize, Serialize};

/// Canonical detector emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Angry,
    Sad,
    Fear,
    Happy,
    Neutral,
    Surprise,
    Disgust,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Sad,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Surprise,
        Emotion::Disgust,
    ];

    /// Parse a raw detector label, ignoring case and surrounding whitespace
    ///
    /// Returns None for anything outside the canonical set (presentation synonyms
    /// such as "joy" are deliberately not accepted here).
    pub fn parse(raw: &str) -> Option<Emotion> {
        let label = raw.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(label))
    }

    /// Canonical label ("Happy", "Sad", ...)
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Sad => "Sad",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Surprise => "Surprise",
            Emotion::Disgust => "Disgust",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Supported song language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Telugu,
    Tamil,
    Hindi,
    English,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Telugu,
        Language::Tamil,
        Language::Hindi,
        Language::English,
    ];

    /// Parse a two-letter code ("te") or full name ("Telugu"), ignoring case
    pub fn parse(raw: &str) -> Option<Language> {
        let value = raw.trim();
        Self::ALL.into_iter().find(|l| {
            l.code().eq_ignore_ascii_case(value) || l.name().eq_ignore_ascii_case(value)
        })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Telugu => "te",
            Language::Tamil => "ta",
            Language::Hindi => "hi",
            Language::English => "en",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Telugu => "Telugu",
            Language::Tamil => "Tamil",
            Language::Hindi => "Hindi",
            Language::English => "English",
        }
    }

    /// Storefront market used when asking the recommender for tracks
    pub fn market(&self) -> &'static str {
        match self {
            Language::English => "US",
            Language::Telugu | Language::Tamil | Language::Hindi => "IN",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
