//! # MoodTune Common Library
//!
//! Shared code for the MoodTune services including:
//! - Event types (MoodEvent enum) and the EventBus
//! - Presentation vocabulary (ThemeState, Tempo, AnalysisPhase)
//! - Bootstrap configuration loading
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
