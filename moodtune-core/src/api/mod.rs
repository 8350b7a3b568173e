//! HTTP API handlers for moodtune-core
//!
//! REST for analysis and lookups, SSE for the presentation channel.

pub mod analyze;
pub mod health;
pub mod mapping;
pub mod recommendations;
pub mod session;
pub mod sse;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use mapping::mapping_routes;
pub use recommendations::recommendation_routes;
pub use session::session_routes;
pub use sse::event_routes;
