//! Independent searches from different seeds, run in parallel

use crate::clock::Clock;
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::search::{SearchOutcome, Solver};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use recon_trace::{CandidatePool, Orientation, TraceStore};

/// Run `workers` solvers on copies of `store` and keep the best outcome
///
/// Worker `i` seeds its `StdRng` with `config.seed + i`, scrambles its own
/// copy of the hypotheses and door codes and owns its own engine; nothing
/// is shared. Ties
/// on the best score go to the lowest worker index.
///
/// # Errors
/// Returns the first worker error, if any.
pub fn solve_portfolio<O, C, F>(
    store: &TraceStore<O>,
    config: &SolverConfig,
    workers: usize,
    clock: F,
) -> Result<SearchOutcome<O>, SolveError>
where
    O: Orientation,
    C: Clock,
    F: Fn() -> C + Sync,
{
    config.validate()?;
    let pool = CandidatePool::new(store.vertex_count());
    let outcomes = (0..workers.max(1) as u64)
        .into_par_iter()
        .map(|worker| {
            let config = config.clone().with_seed(config.seed.wrapping_add(worker));
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut store = store.clone();
            store.randomize(&pool, &mut rng);
            tracing::debug!(worker, seed = config.seed, "worker started");
            Solver::new(store, config, rng, clock())?.run()
        })
        .collect::<Result<Vec<_>, _>>()?;

    outcomes
        .into_iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| a.best_value.total_cmp(&b.best_value).then(ia.cmp(ib)))
        .map(|(worker, outcome)| {
            tracing::info!(worker, score = outcome.best_value, "best worker");
            outcome
        })
        .ok_or(SolveError::NoWorkers)
}
