//! Temperature schedule, acceptance test and stop conditions
//!
//! # State Machine
//!
//! ```text
//! Running ──(elapsed ≥ horizon)──► Stopped(TimeLimit)
//!    └─────(score reaches zero)──► Stopped(Solved)
//! ```
//!
//! `Stopped` is terminal.

use crate::clock::Clock;
use crate::config::AnnealConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The time horizon passed
    TimeLimit,
    /// A zero score was reached
    Solved,
}

/// Lifecycle of an [`AnnealingController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Ticks still advance the schedule
    Running,
    /// Terminal; every later tick returns `false`
    Stopped(StopReason),
}

/// Run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnealStats {
    /// Proposals that reached the acceptance test
    pub iterations: u64,
    /// No-op or empty proposals dropped before scoring
    pub skipped: u64,
    /// Proposals committed
    pub accepted: u64,
    /// Proposals discarded
    pub rejected: u64,
    /// Basin-hop restarts
    pub restarts: u64,
}

/// Simulated-annealing schedule and Metropolis acceptance
#[derive(Debug)]
pub struct AnnealingController<C> {
    config: AnnealConfig,
    clock: C,
    origin: f64,
    elapsed: f64,
    temperature: f64,
    ticks: u64,
    log_table: Vec<f64>,
    cursor: usize,
    state: ControllerState,
    stats: AnnealStats,
}

impl<C: Clock> AnnealingController<C> {
    /// Build the shuffled `log(u)` table and start the schedule
    pub fn new<R: Rng + ?Sized>(config: AnnealConfig, clock: C, rng: &mut R) -> Self {
        let size = config.log_table_size.max(1);
        let inv = 1.0 / size as f64;
        let mut log_table: Vec<f64> = (0..size).map(|i| ((i as f64 + 0.5) * inv).ln()).collect();
        log_table.shuffle(rng);

        let origin = clock.elapsed_secs();
        Self {
            temperature: config.start_temp,
            config,
            clock,
            origin,
            elapsed: 0.0,
            ticks: 0,
            log_table,
            cursor: 0,
            state: ControllerState::Running,
            stats: AnnealStats::default(),
        }
    }

    /// Advance one loop iteration; returns whether the search should go on
    ///
    /// The clock is read only every `time_check_interval` ticks.
    pub fn tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.ticks += 1;
        if self.ticks % self.config.time_check_interval == 0 {
            self.refresh();
        }
        self.is_running()
    }

    /// Read the clock now, update the temperature and check the horizon
    pub fn refresh(&mut self) {
        self.elapsed = (self.clock.elapsed_secs() - self.origin).max(0.0);
        let progress = (self.elapsed / self.config.time_limit_secs).min(1.0);
        self.temperature =
            self.config.start_temp + (self.config.end_temp - self.config.start_temp) * progress;
        if self.is_running() && self.elapsed >= self.config.time_limit_secs {
            tracing::debug!(elapsed = self.elapsed, "time limit reached");
            self.state = ControllerState::Stopped(StopReason::TimeLimit);
        }
    }

    /// Metropolis test for a minimized score
    ///
    /// Improvements and ties always pass. A worsening `diff` passes iff
    /// `diff > log(u) * temperature`, with `log(u)` taken round-robin from
    /// the shuffled table.
    pub fn accept(&mut self, current: f64, candidate: f64) -> bool {
        self.stats.iterations += 1;
        let diff = current - candidate;
        let accepted = diff >= 0.0 || diff > self.next_noise() * self.temperature;
        if accepted {
            self.stats.accepted += 1;
        } else {
            self.stats.rejected += 1;
        }
        accepted
    }

    #[inline]
    fn next_noise(&mut self) -> f64 {
        let noise = self.log_table[self.cursor % self.log_table.len()];
        self.cursor = (self.cursor + 1) % self.config.noise_period;
        noise
    }

    /// Enter `Stopped(reason)` unless already stopped
    pub fn finish(&mut self, reason: StopReason) {
        if self.is_running() {
            self.state = ControllerState::Stopped(reason);
        }
    }

    /// Count a proposal dropped before scoring
    pub fn record_skip(&mut self) {
        self.stats.skipped += 1;
    }

    /// Count a basin-hop restart
    pub fn record_restart(&mut self) {
        self.stats.restarts += 1;
    }

    /// Whether ticks still advance the schedule
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Why the run stopped, once it has
    #[inline]
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.state {
            ControllerState::Running => None,
            ControllerState::Stopped(reason) => Some(reason),
        }
    }

    /// Temperature at the last clock read
    #[inline]
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Elapsed seconds at the last clock read
    #[inline]
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    /// Counters so far
    #[inline]
    #[must_use]
    pub fn stats(&self) -> AnnealStats {
        self.stats
    }

    /// Schedule this controller runs
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AnnealConfig {
        &self.config
    }
}
