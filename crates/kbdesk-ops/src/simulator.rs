//! Simulated progress for uploads without a native progress signal.
//!
//! Two variants share one [`ProgressSimulator`]:
//! - [`ProgressSimulator::track`] ticks toward a ceiling below 100 while the
//!   real call is pending, then hands back its output; the caller snaps the
//!   sink to 100.
//! - [`ProgressSimulator::simulate`] has no real call behind it; reaching 100
//!   is itself the completion signal.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::warn;

use kbdesk_core::progress::MAX_UNRESOLVED;
use kbdesk_core::ProgressSink;

use crate::config::DeskConfig;

/// Consecutive ticks without a positive increment before `simulate` gives up.
pub const MAX_STALLED_TICKS: u32 = 100;

/// Source of per-tick increments.
pub trait IncrementSource: Send {
    fn next_increment(&mut self) -> f64;
}

/// Uniform random increments from an inclusive range.
pub struct RandomIncrements {
    rng: StdRng,
    min: f64,
    max: f64,
}

impl RandomIncrements {
    pub fn new(min: f64, max: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), min, max)
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64, min: f64, max: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), min, max)
    }

    fn with_rng(rng: StdRng, min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { rng, min, max }
    }
}

impl IncrementSource for RandomIncrements {
    fn next_increment(&mut self) -> f64 {
        self.rng.gen_range(self.min..=self.max)
    }
}

/// Cycles through a fixed list of increments.
pub struct FixedIncrements {
    steps: Vec<f64>,
    next: usize,
}

impl FixedIncrements {
    /// An empty list behaves like a constant increment of zero.
    pub fn new(steps: impl Into<Vec<f64>>) -> Self {
        Self {
            steps: steps.into(),
            next: 0,
        }
    }

    pub fn constant(step: f64) -> Self {
        Self::new(vec![step])
    }
}

impl IncrementSource for FixedIncrements {
    fn next_increment(&mut self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let step = self.steps[self.next % self.steps.len()];
        self.next = self.next.wrapping_add(1);
        step
    }
}

/// Fixed-interval progress ticker.
pub struct ProgressSimulator {
    tick: Duration,
    ceiling: f64,
    source: Mutex<Box<dyn IncrementSource>>,
}

impl std::fmt::Debug for ProgressSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSimulator")
            .field("tick", &self.tick)
            .field("ceiling", &self.ceiling)
            .finish()
    }
}

impl ProgressSimulator {
    pub fn new(tick: Duration, ceiling: f64, source: impl IncrementSource + 'static) -> Self {
        Self {
            tick,
            ceiling: ceiling.min(MAX_UNRESOLVED),
            source: Mutex::new(Box::new(source)),
        }
    }

    /// Random increments, tick, and ceiling from the desk configuration.
    pub fn from_config(config: &DeskConfig) -> Self {
        Self::new(
            config.progress_tick(),
            config.progress_ceiling,
            RandomIncrements::new(config.progress_step_min, config.progress_step_max),
        )
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    fn next_increment(&self) -> f64 {
        match self.source.lock() {
            Ok(mut source) => source.next_increment(),
            Err(poisoned) => poisoned.into_inner().next_increment(),
        }
    }

    fn ticker(&self) -> tokio::time::Interval {
        let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Tick `sink` toward the ceiling until `work` resolves.
    ///
    /// Resolution wins over a tick due at the same instant. The sink is left
    /// below 100; completing it is the caller's decision.
    pub async fn track<F>(&self, sink: &ProgressSink, work: F) -> F::Output
    where
        F: Future,
    {
        tokio::pin!(work);
        let mut ticker = self.ticker();
        loop {
            tokio::select! {
                biased;
                output = &mut work => return output,
                _ = ticker.tick() => {
                    sink.advance(self.next_increment(), self.ceiling);
                }
            }
        }
    }

    /// Pure simulation: tick until the synthetic value reaches 100.
    ///
    /// Values shown through `sink` stay below 100; the caller completes the
    /// sink once this returns. Ends early after [`MAX_STALLED_TICKS`] ticks
    /// in a row without a positive increment.
    pub async fn simulate(&self, sink: &ProgressSink) {
        let mut synthetic = sink.value();
        let mut stalled = 0;
        let mut ticker = self.ticker();
        while synthetic < 100.0 {
            ticker.tick().await;
            let step = self.next_increment();
            if step.is_nan() || step <= 0.0 {
                stalled += 1;
                if stalled >= MAX_STALLED_TICKS {
                    warn!(
                        subsystem = "upload",
                        progress = synthetic,
                        "Simulated progress stalled; finishing early"
                    );
                    return;
                }
                continue;
            }
            stalled = 0;
            synthetic += step;
            sink.report(synthetic);
        }
    }
}
