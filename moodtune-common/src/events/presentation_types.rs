//! Presentation-related type definitions
//!
//! Supporting types shared between the orchestrator and whatever renders its state:
//! analysis phase, ambient theme, and the pulse tempo of the beat animation.

use serde::{Deserialize, Serialize};

/// Analysis phase of a session
///
/// Idle → Analyzing → {Ready, Failed}; Ready/Failed → Analyzing on the next submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisPhase {
    /// No analysis has been submitted yet
    #[default]
    Idle,
    /// Detection/recommendation in flight
    Analyzing,
    /// Last analysis completed (possibly with zero tracks)
    Ready,
    /// Last analysis aborted at some stage
    Failed,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisPhase::Idle => write!(f, "IDLE"),
            AnalysisPhase::Analyzing => write!(f, "ANALYZING"),
            AnalysisPhase::Ready => write!(f, "READY"),
            AnalysisPhase::Failed => write!(f, "FAILED"),
        }
    }
}

/// Ambient presentation theme
///
/// Always one of eight fixed values; `Default` until something has been derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeState {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprised,
    Calm,
    Neutral,
    #[default]
    Default,
}

impl ThemeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeState::Happy => "happy",
            ThemeState::Sad => "sad",
            ThemeState::Angry => "angry",
            ThemeState::Fear => "fear",
            ThemeState::Surprised => "surprised",
            ThemeState::Calm => "calm",
            ThemeState::Neutral => "neutral",
            ThemeState::Default => "default",
        }
    }
}

impl std::fmt::Display for ThemeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete pulse tempo for the beat animation (five buckets)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tempo {
    Slowest,
    Slow,
    Moderate,
    Fast,
    Fastest,
}

impl Tempo {
    /// Duration of one pulse of the animation, in milliseconds
    pub fn pulse_ms(&self) -> u64 {
        match self {
            Tempo::Fastest => 300,
            Tempo::Fast => 450,
            Tempo::Moderate => 600,
            Tempo::Slow => 800,
            Tempo::Slowest => 1000,
        }
    }
}

impl std::fmt::Display for Tempo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tempo::Slowest => write!(f, "slowest"),
            Tempo::Slow => write!(f, "slow"),
            Tempo::Moderate => write!(f, "moderate"),
            Tempo::Fast => write!(f, "fast"),
            Tempo::Fastest => write!(f, "fastest"),
        }
    }
}
