//! Recon Anneal
//!
//! Simulated-annealing search driving the incremental score engine.
//!
//! # Core Concepts
//!
//! - [`SolverConfig`]: schedule, move mix and scoring parameters (TOML)
//! - [`AnnealingController`]: temperature, acceptance test, stop conditions
//! - [`MoveGenerator`]: single and linked-group reassignments plus door
//!   recodes for layered stores
//! - [`Solver`]: propose → stage → accept → commit/discard loop with
//!   best-state tracking and basin-hop restarts
//! - [`solve_portfolio`]: independent seeded solvers on a `rayon` pool
//! - [`Clock`]: injectable time source
//!
//! # Example
//!
//! ```rust,ignore
//! use rand::{rngs::StdRng, SeedableRng};
//! use recon_anneal::{Solver, SolverConfig, WallClock};
//!
//! let config = SolverConfig::default().with_seed(7);
//! let rng = StdRng::seed_from_u64(config.seed);
//! let outcome = Solver::new(store, config, rng, WallClock::new())?.run()?;
//! if outcome.solved {
//!     // complete the graph from outcome.engine
//! }
//! ```

#![warn(unreachable_pub)]

mod clock;
mod config;
mod controller;
mod error;
mod moves;
mod portfolio;
mod search;

pub use clock::{Clock, ManualClock, WallClock};
pub use config::{AnnealConfig, MoveConfig, SolverConfig};
pub use controller::{AnnealStats, AnnealingController, ControllerState, StopReason};
pub use error::{ConfigError, SolveError};
pub use moves::{MoveGenerator, MoveKind, Proposal};
pub use portfolio::solve_portfolio;
pub use search::{SearchOutcome, SearchReport, Solver};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
