//! Error types for configuration and the search driver

use recon_score::ScoreError;
use recon_trace::StoreError;

/// Rejected solver configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// Config text is not valid for [`crate::SolverConfig`]
    #[error("invalid TOML: {0}")]
    Toml(String),

    /// Times, temperatures and weights must be finite and positive
    #[error("{0} must be positive")]
    NonPositive(&'static str),

    /// The schedule only ever cools
    #[error("end temperature {end} above start temperature {start}")]
    RisingTemperature { start: f64, end: f64 },

    /// Periods and table sizes must be at least one
    #[error("{0} must be non-zero")]
    ZeroPeriod(&'static str),

    /// Percentages are at most 100
    #[error("{field} = {value} exceeds 100")]
    Percent { field: &'static str, value: u32 },
}

/// Errors raised by [`crate::Solver`]
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// Rejected configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Store could not be built or updated
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Protocol misuse inside the search loop
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// A portfolio run produced no outcome
    #[error("portfolio ran no workers")]
    NoWorkers,

    /// Periodic validation found incremental counters out of sync
    #[error("engine drift after {commits} commits: {source}")]
    Drift {
        commits: u64,
        #[source]
        source: ScoreError,
    },
}
