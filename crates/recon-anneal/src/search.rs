//! The annealing driver loop

use crate::clock::Clock;
use crate::config::SolverConfig;
use crate::controller::{AnnealStats, AnnealingController, StopReason};
use crate::error::SolveError;
use crate::moves::MoveGenerator;
use rand::Rng;
use recon_score::{DiffBuilder, Score, ScoreEngine};
use recon_trace::{CandidatePool, HypothesisSnapshot, Orientation, Plain, TraceStore};
use serde::Serialize;

/// Serializable summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Weighted score before the first move
    pub start_score: f64,
    /// Weighted best score
    pub best_score: f64,
    /// Best score is zero
    pub solved: bool,
    /// Why the loop ended
    pub stop_reason: StopReason,
    /// Clock seconds spent
    pub elapsed_secs: f64,
    /// Controller counters
    pub stats: AnnealStats,
}

/// Result of [`Solver::run`]
///
/// `store` holds the best hypotheses and door codes found and `engine` is
/// rebuilt from them, ready for graph completion.
#[derive(Debug)]
pub struct SearchOutcome<O = Plain> {
    /// Score before the first move
    pub start_score: Score,
    /// Best score reached
    pub best_score: Score,
    /// Weighted [`SearchOutcome::best_score`]
    pub best_value: f64,
    /// Best score is zero
    pub solved: bool,
    /// Why the loop ended
    pub stop_reason: StopReason,
    /// Clock seconds spent
    pub elapsed_secs: f64,
    /// Controller counters
    pub stats: AnnealStats,
    /// Best hypotheses and door codes
    pub store: TraceStore<O>,
    /// Engine rebuilt from `store`
    pub engine: ScoreEngine,
}

impl<O> SearchOutcome<O> {
    /// Serializable summary
    #[must_use]
    pub fn report(&self) -> SearchReport {
        let config = self.engine.config();
        SearchReport {
            start_score: self.start_score.value(config),
            best_score: self.best_value,
            solved: self.solved,
            stop_reason: self.stop_reason,
            elapsed_secs: self.elapsed_secs,
            stats: self.stats,
        }
    }
}

/// Simulated-annealing search over vertex hypotheses and door codes
///
/// Each iteration proposes a move, stages its changeset, asks the
/// controller for acceptance and then commits or discards. The best
/// hypotheses seen are kept; after `restart_after` unimproved loop ticks
/// the search returns to them and re-randomizes a span of every trace.
pub struct Solver<R, C, O = Plain> {
    config: SolverConfig,
    store: TraceStore<O>,
    engine: ScoreEngine,
    controller: AnnealingController<C>,
    generator: MoveGenerator,
    rng: R,
    start_score: Score,
    best: HypothesisSnapshot,
    best_score: Score,
    since_improvement: u64,
    commits: u64,
}

impl<R: Rng, C: Clock, O: Orientation> Solver<R, C, O> {
    /// Validate `config` and score the store's current hypotheses
    ///
    /// # Errors
    /// Returns [`SolveError::Config`] for an invalid configuration.
    pub fn new(store: TraceStore<O>, config: SolverConfig, mut rng: R, clock: C) -> Result<Self, SolveError> {
        config.validate()?;
        let engine = ScoreEngine::from_store(&store, config.score);
        let controller = AnnealingController::new(config.anneal.clone(), clock, &mut rng);
        let generator = MoveGenerator::new(config.moves.clone(), CandidatePool::new(store.vertex_count()));
        let score = engine.score();
        Ok(Self {
            best: store.snapshot(),
            config,
            store,
            engine,
            controller,
            generator,
            rng,
            start_score: score,
            best_score: score,
            since_improvement: 0,
            commits: 0,
        })
    }

    /// Score of the current hypotheses
    #[inline]
    #[must_use]
    pub fn score(&self) -> Score {
        self.engine.score()
    }

    /// Weighted score of the current hypotheses
    #[inline]
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.engine.score_value()
    }

    /// Run until the score reaches zero or the time horizon passes
    ///
    /// # Errors
    /// Returns [`SolveError::Drift`] if periodic validation fails, or a
    /// protocol error from the engine.
    pub fn run(mut self) -> Result<SearchOutcome<O>, SolveError> {
        let score_config = self.config.score;
        let mut best_value = self.best_score.value(&score_config);
        tracing::info!(score = best_value, bad = self.engine.bad_positions().len(), "start");

        if self.best_score.is_zero() {
            self.controller.finish(StopReason::Solved);
        }

        while self.controller.tick() {
            if self.since_improvement >= self.config.anneal.restart_after {
                self.restart();
                self.since_improvement = 0;
            }
            self.since_improvement += 1;

            let Some(proposal) = self
                .generator
                .propose(&self.store, self.engine.bad_positions(), &mut self.rng)
            else {
                self.controller.record_skip();
                continue;
            };

            let changes = match proposal.recode {
                Some(recode) => DiffBuilder::recode(&self.store, recode),
                None => DiffBuilder::build(&self.store, &proposal.reassignments),
            };
            self.engine.stage(&changes)?;
            let current = self.engine.score_value();
            let candidate = current + self.engine.score_delta_value();

            if self.controller.accept(current, candidate) {
                self.store.apply(&proposal.reassignments);
                if let Some(recode) = proposal.recode {
                    self.store.recode(recode);
                }
                self.engine.commit(&self.store)?;
                self.commits += 1;
                self.validate()?;
            } else {
                self.engine.discard();
            }

            let value = self.engine.score_value();
            if value < best_value {
                best_value = value;
                self.best_score = self.engine.score();
                self.best = self.store.snapshot();
                self.since_improvement = 0;
                tracing::info!(score = value, kind = ?proposal.kind, "improved");
                if self.best_score.is_zero() {
                    self.controller.finish(StopReason::Solved);
                }
            }
        }

        self.controller.refresh();
        let stop_reason = self.controller.stop_reason().unwrap_or(StopReason::TimeLimit);
        let stats = self.controller.stats();
        let elapsed_secs = self.controller.elapsed_secs();
        tracing::info!(score = best_value, reason = ?stop_reason, "end");
        tracing::info!(
            iterations = stats.iterations,
            accepted = stats.accepted,
            rejected = stats.rejected,
            skipped = stats.skipped,
            restarts = stats.restarts,
            "stats"
        );

        self.store.restore(&self.best);
        self.engine.full_rescan(&self.store);
        Ok(SearchOutcome {
            start_score: self.start_score,
            best_score: self.best_score,
            best_value,
            solved: self.best_score.is_zero(),
            stop_reason,
            elapsed_secs,
            stats,
            store: self.store,
            engine: self.engine,
        })
    }

    /// Basin hop: back to the best hypotheses, then redraw one span of
    /// steps in every trace
    fn restart(&mut self) {
        self.store.restore(&self.best);
        let span = self
            .config
            .anneal
            .restart_span
            .unwrap_or_else(|| self.store.vertex_count());
        let shortest = self
            .store
            .traces()
            .iter()
            .map(recon_trace::Trace::len)
            .min()
            .unwrap_or(0);
        let from = self.rng.gen_range(1..=shortest.saturating_sub(span).max(1));
        for trace in 0..self.store.trace_count() {
            self.store
                .randomize_span(trace, from, from + span, self.generator.pool(), &mut self.rng);
        }
        let score = self.engine.full_rescan(&self.store);
        self.controller.record_restart();
        tracing::debug!(from, span, score = score.value(&self.config.score), "restart");
    }

    fn validate(&self) -> Result<(), SolveError> {
        let every = self.config.validate_every;
        if every == 0 || self.commits % every != 0 {
            return Ok(());
        }
        self.engine
            .verify(&self.store)
            .map_err(|source| SolveError::Drift {
                commits: self.commits,
                source,
            })
    }
}
