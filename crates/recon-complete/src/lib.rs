//! Recon Complete
//!
//! Turns a zero-contradiction hypothesis into a fully defined door graph
//! and checks it against the observations.
//!
//! # Core Concepts
//!
//! - [`GraphCompleter`]: majority vote per door, then leftover-parent
//!   matching for doors no trace used
//! - [`DoorTable`]: one destination per `(vertex, door)`
//! - [`Orientation`]: per-door layer permutations ([`Plain`], [`Mirror`],
//!   [`Triad`]) and the [`LayeredTable`] they act on
//! - [`replay`]: re-walk traces through a table and count label mismatches
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_complete::{replay, GraphCompleter, LayeredTable};
//!
//! let completion = GraphCompleter::complete(&outcome.engine);
//! let layered = LayeredTable::plain(completion.table.clone());
//! assert!(replay(&layered, outcome.store.traces())?.is_consistent());
//! ```

#![warn(unreachable_pub)]

mod completer;
mod error;
mod layered;
mod replay;
mod table;

pub use completer::{Completion, GraphCompleter};
pub use error::CompleteError;
pub use layered::LayeredTable;
pub use recon_trace::{Mirror, Orientation, Plain, Triad};
pub use replay::{replay, replay_table, ReplayReport};
pub use table::DoorTable;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
