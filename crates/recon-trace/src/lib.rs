//! Recon Trace
//!
//! Observed walks over an unknown door graph and the vertex hypothesis the
//! search mutates.
//!
//! # Core Concepts
//!
//! - [`Trace`]: door choices and observed labels of one walk
//! - [`TraceStore`]: every trace plus the current hypothesis (one vertex per
//!   step, one orientation code per base door)
//! - [`Orientation`]: per-door layer permutations ([`Plain`], [`Mirror`],
//!   [`Triad`]) and the [`label_misses`] replay they drive
//! - [`CandidatePool`]: label class → vertices that may carry that label
//! - [`parse_input`]: text input → [`ParsedInput`]
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_trace::{parse_input, CandidatePool};
//!
//! let mut store = parse_input(&text)?.into_store()?;
//! let pool = CandidatePool::new(store.vertex_count());
//! store.randomize(&pool, &mut rng);
//! ```

#![warn(unreachable_pub)]

mod error;
mod orientation;
mod parse;
mod pool;
mod store;
mod trace;
mod types;

pub use error::{ParseError, StoreError};
pub use orientation::{label_misses, Layering, Mirror, Orientation, Plain, Triad};
pub use parse::{parse_input, ParsedInput};
pub use pool::CandidatePool;
pub use store::{HypothesisSnapshot, Reassignment, Recode, TraceStore, START_VERTEX};
pub use trace::Trace;
pub use types::{Door, DoorKey, Label, Position, Vertex, DOOR_COUNT, LABEL_COUNT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
