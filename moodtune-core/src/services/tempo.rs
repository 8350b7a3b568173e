//! Simulated beat tempo generator
//!
//! States: Idle, Running. While running, a background task wakes after a jittered
//! delay, samples an energy value from a theme-dependent range, buckets it into a
//! `Tempo`, and publishes a `TempoTick` on the event bus.
//!
//! Cancellation: each `start()` opens a new generation and each `stop()` closes it.
//! A tick is only published while holding the generator lock and only if its
//! generation is still current, so once `stop()` returns no tick from the old run
//! can appear, even one whose timer had already fired.

use chrono::Utc;
use moodtune_common::events::{EventBus, MoodEvent, Tempo, ThemeState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay between ticks is drawn uniformly from this range (milliseconds)
pub const TICK_INTERVAL_MS: Range<u64> = 150..400;

/// Generator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoState {
    Idle,
    Running,
}

/// Energy range sampled for a theme
pub fn energy_range(theme: ThemeState) -> Range<f64> {
    match theme {
        ThemeState::Angry | ThemeState::Happy => 0.65..1.0,
        ThemeState::Sad | ThemeState::Calm => 0.05..0.4,
        ThemeState::Surprised => 0.0..1.0,
        ThemeState::Fear | ThemeState::Neutral | ThemeState::Default => 0.3..0.7,
    }
}

/// Bucket an energy value into one of five tempos
pub fn tempo_for_energy(energy: f64) -> Tempo {
    if energy > 0.8 {
        Tempo::Fastest
    } else if energy > 0.6 {
        Tempo::Fast
    } else if energy > 0.4 {
        Tempo::Moderate
    } else if energy > 0.2 {
        Tempo::Slow
    } else {
        Tempo::Slowest
    }
}

struct Run {
    token: CancellationToken,
    theme: ThemeState,
}

struct TempoInner {
    generation: u64,
    run: Option<Run>,
}

/// Handle for one run of the generator
///
/// Becomes stale as soon as the run is stopped or superseded by another `start()`.
#[derive(Clone)]
pub struct TempoHandle {
    generation: u64,
    inner: Arc<Mutex<TempoInner>>,
}

impl TempoHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while this run is the one producing ticks
    pub fn is_active(&self) -> bool {
        let inner = lock(&self.inner);
        inner.generation == self.generation && inner.run.is_some()
    }
}

impl std::fmt::Debug for TempoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempoHandle")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Cancellable tick scheduler owned by the theme engine
pub struct TempoGenerator {
    inner: Arc<Mutex<TempoInner>>,
    event_bus: EventBus,
}

fn lock(inner: &Mutex<TempoInner>) -> MutexGuard<'_, TempoInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TempoGenerator {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TempoInner {
                generation: 0,
                run: None,
            })),
            event_bus,
        }
    }

    pub fn state(&self) -> TempoState {
        if lock(&self.inner).run.is_some() {
            TempoState::Running
        } else {
            TempoState::Idle
        }
    }

    /// Start ticking for `theme`, replacing any current run
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, theme: ThemeState) -> TempoHandle {
        let token = CancellationToken::new();
        let generation = {
            let mut inner = lock(&self.inner);
            if let Some(previous) = inner.run.take() {
                previous.token.cancel();
            }
            inner.generation += 1;
            inner.run = Some(Run {
                token: token.clone(),
                theme,
            });
            inner.generation
        };

        tracing::debug!(generation, theme = %theme, "Tempo generator started");

        tokio::spawn(run_ticks(
            Arc::clone(&self.inner),
            self.event_bus.clone(),
            generation,
            theme,
            token,
        ));

        TempoHandle {
            generation,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Stop ticking; returns false if already idle
    ///
    /// No tick of the stopped run is published after this returns.
    pub fn stop(&self) -> bool {
        let mut inner = lock(&self.inner);
        let Some(run) = inner.run.take() else {
            return false;
        };
        run.token.cancel();
        let stopped_generation = inner.generation;
        inner.generation += 1;

        self.event_bus.emit_lossy(MoodEvent::TempoStopped {
            generation: stopped_generation,
            timestamp: Utc::now(),
        });
        drop(inner);

        tracing::debug!(generation = stopped_generation, "Tempo generator stopped");
        true
    }
}

impl Drop for TempoGenerator {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        if let Some(run) = inner.run.take() {
            run.token.cancel();
            inner.generation += 1;
        }
    }
}

async fn run_ticks(
    inner: Arc<Mutex<TempoInner>>,
    event_bus: EventBus,
    generation: u64,
    theme: ThemeState,
    token: CancellationToken,
) {
    let mut rng = StdRng::from_entropy();

    loop {
        let delay = Duration::from_millis(rng.gen_range(TICK_INTERVAL_MS));
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let energy = rng.gen_range(energy_range(theme));
        if !publish_if_current(&inner, &event_bus, generation, theme, energy) {
            break;
        }
    }

    tracing::trace!(generation, "Tempo tick task exited");
}

/// Publish one tick while holding the lock; false if this run is no longer current
fn publish_if_current(
    inner: &Mutex<TempoInner>,
    event_bus: &EventBus,
    generation: u64,
    theme: ThemeState,
    energy: f64,
) -> bool {
    let inner = lock(inner);
    let current = inner.generation == generation
        && inner
            .run
            .as_ref()
            .is_some_and(|run| !run.token.is_cancelled());
    if !current {
        return false;
    }

    let tempo = tempo_for_energy(energy);
    event_bus.emit_lossy(MoodEvent::TempoTick {
        generation,
        energy,
        tempo,
        pulse_ms: tempo.pulse_ms(),
        theme,
        timestamp: Utc::now(),
    });
    true
}
