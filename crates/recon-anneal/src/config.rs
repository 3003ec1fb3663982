//! Solver configuration
//!
//! Every field has a default, so a TOML file only names what it overrides:
//!
//! ```toml
//! seed = 7
//! layering = "mirror"
//!
//! [anneal]
//! time_limit_secs = 30.0
//! start_temp = 1.0
//!
//! [moves]
//! bad_pick_percent = 40
//! ```

use crate::error::ConfigError;
use recon_score::ScoreConfig;
use recon_trace::Layering;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Temperature schedule, time budget and restart policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Wall-clock horizon of the whole run
    pub time_limit_secs: f64,
    /// Temperature at time zero
    pub start_temp: f64,
    /// Temperature reached at the horizon
    pub end_temp: f64,
    /// Iterations between clock reads
    pub time_check_interval: u64,
    /// Entries in the shuffled `log(u)` table
    pub log_table_size: usize,
    /// Table entries consumed before the cursor wraps
    pub noise_period: usize,
    /// Unimproved iterations before a basin-hop restart
    pub restart_after: u64,
    /// Steps re-randomized per trace on restart; `None` uses the vertex count
    pub restart_span: Option<usize>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 10.0,
            start_temp: 0.5,
            end_temp: 1e-9,
            time_check_interval: 0x10000,
            log_table_size: 0x10000,
            noise_period: 0x10000,
            restart_after: 0x10000,
            restart_span: None,
        }
    }
}

impl AnnealConfig {
    /// Set the run horizon
    #[inline]
    #[must_use]
    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Set the initial temperature
    #[inline]
    #[must_use]
    pub fn with_start_temp(mut self, temp: f64) -> Self {
        self.start_temp = temp;
        self
    }

    /// Set ticks between clock reads
    #[inline]
    #[must_use]
    pub fn with_time_check_interval(mut self, interval: u64) -> Self {
        self.time_check_interval = interval;
        self
    }

    /// Set unimproved ticks before a restart
    #[inline]
    #[must_use]
    pub fn with_restart_after(mut self, iterations: u64) -> Self {
        self.restart_after = iterations;
        self
    }
}

/// Move mix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    /// Chance (percent) a single reposition samples the bad-position list
    pub bad_pick_percent: u32,
    /// Chance (percent) of a linked-group move instead of a single one
    pub group_move_percent: u32,
    /// Chance (percent) of a door recode; ignored for single-code layerings
    pub recode_percent: u32,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            bad_pick_percent: 30,
            group_move_percent: 5,
            recode_percent: 25,
        }
    }
}

/// Full solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Seed for the solver's `StdRng`
    pub seed: u64,
    /// Verify the engine against a full rescan every this many commits; 0 disables
    pub validate_every: u64,
    /// Copies of the base graph the input's rooms split into
    pub layering: Layering,
    /// Schedule and restart policy
    pub anneal: AnnealConfig,
    /// Move mix
    pub moves: MoveConfig,
    /// Score weights and degree budget
    pub score: ScoreConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            validate_every: 0,
            layering: Layering::Plain,
            anneal: AnnealConfig::default(),
            moves: MoveConfig::default(),
            score: ScoreConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Defaults; same as [`SolverConfig::default`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the solver seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the schedule
    #[inline]
    #[must_use]
    pub fn with_anneal(mut self, anneal: AnnealConfig) -> Self {
        self.anneal = anneal;
        self
    }

    /// Replace the move mix
    #[inline]
    #[must_use]
    pub fn with_moves(mut self, moves: MoveConfig) -> Self {
        self.moves = moves;
        self
    }

    /// Set the layer split of the input rooms
    #[inline]
    #[must_use]
    pub fn with_layering(mut self, layering: Layering) -> Self {
        self.layering = layering;
        self
    }

    /// Set the periodic rescan interval
    #[inline]
    #[must_use]
    pub fn with_validate_every(mut self, commits: u64) -> Self {
        self.validate_every = commits;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] for malformed input.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] or [`ConfigError::Toml`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values the search cannot run with
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.anneal;
        if !(a.time_limit_secs.is_finite() && a.time_limit_secs > 0.0) {
            return Err(ConfigError::NonPositive("anneal.time_limit_secs"));
        }
        if !(a.start_temp.is_finite() && a.start_temp > 0.0) {
            return Err(ConfigError::NonPositive("anneal.start_temp"));
        }
        if !(a.end_temp.is_finite() && a.end_temp > 0.0) {
            return Err(ConfigError::NonPositive("anneal.end_temp"));
        }
        if a.end_temp > a.start_temp {
            return Err(ConfigError::RisingTemperature {
                start: a.start_temp,
                end: a.end_temp,
            });
        }
        for (field, value) in [
            ("anneal.time_check_interval", a.time_check_interval),
            ("anneal.log_table_size", a.log_table_size as u64),
            ("anneal.noise_period", a.noise_period as u64),
            ("anneal.restart_after", a.restart_after),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroPeriod(field));
            }
        }
        if a.restart_span == Some(0) {
            return Err(ConfigError::ZeroPeriod("anneal.restart_span"));
        }
        for (field, value) in [
            ("moves.bad_pick_percent", self.moves.bad_pick_percent),
            ("moves.group_move_percent", self.moves.group_move_percent),
            ("moves.recode_percent", self.moves.recode_percent),
        ] {
            if value > 100 {
                return Err(ConfigError::Percent { field, value });
            }
        }
        if !(self.score.conflict_weight.is_finite() && self.score.conflict_weight > 0.0) {
            return Err(ConfigError::NonPositive("score.conflict_weight"));
        }
        if !(self.score.mismatch_weight.is_finite() && self.score.mismatch_weight > 0.0) {
            return Err(ConfigError::NonPositive("score.mismatch_weight"));
        }
        Ok(())
    }
}
