//! Recon Score
//!
//! Incremental consistency scoring of a vertex hypothesis.
//!
//! # Core Concepts
//!
//! - [`ChangeSet`]: signed edge-vote and label-mismatch deltas of one move
//! - [`DiffBuilder`]: reassignments and door recodes → [`ChangeSet`]
//! - [`ScoreEngine`]: committed counters plus the stage / score / commit /
//!   discard protocol
//! - [`DirtySets`]: keys a staged changeset touches
//! - [`Score`]: exact conflict, degree-excess and label-mismatch components
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_score::{DiffBuilder, ScoreConfig, ScoreEngine};
//!
//! let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());
//! let changes = DiffBuilder::single(&store, position, vertex);
//! engine.stage(&changes)?;
//! if engine.score_delta_value() <= 0.0 {
//!     store.set_hypothesis(position, vertex)?;
//!     engine.commit(&store)?;
//! } else {
//!     engine.discard();
//! }
//! ```

#![warn(unreachable_pub)]

mod changeset;
mod diff;
mod dirty;
mod engine;
mod error;
mod score;

pub use changeset::{ChangeSet, Edge, EdgeDelta, MissDelta};
pub use diff::DiffBuilder;
pub use dirty::DirtySets;
pub use engine::ScoreEngine;
pub use error::ScoreError;
pub use score::{Score, ScoreConfig, ScoreDelta};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
