//! Shared fakes for integration tests
//!
//! `FakeDetector` and `FakeRecommender` stand in for the external services behind the
//! `EmotionDetector` / `TrackRecommender` seams. Both count calls; the detector can be
//! gated so a test can hold an analysis in flight.

#![allow(dead_code)]

use async_trait::async_trait;
use moodtune_common::events::EventBus;
use moodtune_core::models::Track;
use moodtune_core::services::{
    DetectionError, DetectionResult, EmotionDetector, ImageSource, RecommendationError,
    TrackRecommender,
};
use moodtune_core::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A valid tiny data URL ("hello")
pub const TEST_FRAME: &str = "data:image/jpeg;base64,aGVsbG8=";

/// What the fake detector answers
#[derive(Debug, Clone)]
pub enum DetectorScript {
    Emotion(&'static str, Option<f64>),
    Timeout,
    Upstream(u16, &'static str),
}

pub struct FakeDetector {
    script: Mutex<DetectorScript>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl FakeDetector {
    pub fn new(script: DetectorScript) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            gate: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// Detector that waits for `gate.notify_one()` before answering
    pub fn gated(script: DetectorScript, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            gate: Some(gate),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn emotion(label: &'static str, confidence: Option<f64>) -> Arc<Self> {
        Self::new(DetectorScript::Emotion(label, confidence))
    }

    pub fn set_script(&self, script: DetectorScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmotionDetector for FakeDetector {
    async fn detect(&self, source: ImageSource) -> Result<DetectionResult, DetectionError> {
        source.validate()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let script = self.script.lock().unwrap().clone();
        match script {
            DetectorScript::Emotion(label, confidence) => {
                Ok(DetectionResult::new(label, confidence))
            }
            DetectorScript::Timeout => Err(DetectionError::Timeout),
            DetectorScript::Upstream(status, message) => Err(DetectionError::Upstream {
                status,
                message: message.to_string(),
            }),
        }
    }
}

/// Arguments of one recommend() call
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendCall {
    pub seeds: Vec<String>,
    pub limit: u32,
    pub market: String,
}

#[derive(Debug, Clone)]
pub enum RecommenderScript {
    Tracks(Vec<Track>),
    Upstream(u16, &'static str),
    Timeout,
}

pub struct FakeRecommender {
    script: Mutex<RecommenderScript>,
    calls: Mutex<Vec<RecommendCall>>,
}

impl FakeRecommender {
    pub fn new(script: RecommenderScript) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn with_tracks(tracks: Vec<Track>) -> Arc<Self> {
        Self::new(RecommenderScript::Tracks(tracks))
    }

    pub fn calls(&self) -> Vec<RecommendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TrackRecommender for FakeRecommender {
    async fn recommend(
        &self,
        seeds: &[String],
        limit: u32,
        market: &str,
    ) -> Result<Vec<Track>, RecommendationError> {
        if seeds.is_empty() {
            return Err(RecommendationError::EmptySeeds);
        }
        self.calls.lock().unwrap().push(RecommendCall {
            seeds: seeds.to_vec(),
            limit,
            market: market.to_string(),
        });
        let script = self.script.lock().unwrap().clone();
        match script {
            RecommenderScript::Tracks(tracks) => Ok(tracks),
            RecommenderScript::Upstream(status, message) => Err(RecommendationError::Upstream {
                status,
                message: message.to_string(),
            }),
            RecommenderScript::Timeout => Err(RecommendationError::Timeout),
        }
    }
}

/// Two linked tracks with neutral titles
pub fn sample_tracks() -> Vec<Track> {
    let mut first = Track::new("Song One", "Artist A");
    first.external_url = Some("https://open.spotify.com/track/one".to_string());
    first.embeddable_url = Some("https://open.spotify.com/embed/track/one".to_string());
    let second = Track::new("Song Two", "Artist B");
    vec![first, second]
}

/// App state wired to fakes, default limit 10
pub fn test_app_state(
    detector: Arc<FakeDetector>,
    recommender: Arc<FakeRecommender>,
) -> AppState {
    AppState::new(detector, recommender, EventBus::new(256), 10)
}

/// Poll until `condition` holds (max ~2s)
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
