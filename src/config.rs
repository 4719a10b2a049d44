//! Tunables shared by the adapter, compiler and normalizer.

use std::env;

use crate::ast::ScoreMode;

/// Default bound on condition nesting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Default bound on normalizer fixed-point passes.
pub const DEFAULT_MAX_PASSES: usize = 10_000;

/// Settings for walking and rewriting condition trees.
///
/// # Examples
///
/// ```
/// use oqr::{Config, ScoreMode};
///
/// let config = Config::default()
///     .with_max_depth(64)
///     .with_all_score_mode(ScoreMode::Multiply);
/// assert_eq!(config.max_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest tree accepted; deeper input fails instead of being truncated
    pub max_depth: usize,

    /// Upper bound on normalizer passes before giving up
    pub max_passes: usize,

    /// Arithmetic used for AND-combined scores (`Sum` or `Multiply`)
    pub all_score_mode: ScoreMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            max_passes: DEFAULT_MAX_PASSES,
            all_score_mode: ScoreMode::Sum,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_all_score_mode(mut self, mode: ScoreMode) -> Self {
        self.all_score_mode = mode;
        self
    }

    /// Defaults overridden by `OQR_MAX_DEPTH`, `OQR_MAX_PASSES` and
    /// `OQR_ALL_SCORE_MODE` (`sum` or `multiply`).
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(raw) = env::var("OQR_MAX_DEPTH") {
            match raw.parse() {
                Ok(n) => config.max_depth = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid OQR_MAX_DEPTH"),
            }
        }
        if let Ok(raw) = env::var("OQR_MAX_PASSES") {
            match raw.parse() {
                Ok(n) => config.max_passes = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid OQR_MAX_PASSES"),
            }
        }
        if let Ok(raw) = env::var("OQR_ALL_SCORE_MODE") {
            match ScoreMode::parse_all_mode(&raw) {
                Some(mode) => config.all_score_mode = mode,
                None => tracing::warn!(value = %raw, "ignoring invalid OQR_ALL_SCORE_MODE"),
            }
        }

        config
    }
}
