//! Data models for moodtune-core
//!
//! - Closed vocabularies (Emotion, Language)
//! - Canonical Track shape
//! - Session state owned by the orchestrator

pub mod emotion;
pub mod session;
pub mod track;

pub use emotion::{Emotion, Language};
pub use session::{Advisory, Session, SessionFailure, SessionSnapshot, StateTransition};
pub use track::Track;
