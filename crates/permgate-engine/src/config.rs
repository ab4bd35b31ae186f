//! Engine configuration loaded from TOML
//!
//! ```toml
//! [evaluation]
//! max_depth = 32
//! max_steps = 256
//!
//! [oracle]
//! timeout_ms = 250
//! max_workers = 16
//! max_queries = 16
//! ```
//!
//! Missing sections and fields take their defaults.

use crate::error::ConfigError;
use core_params::{EvalLimits, MAX_EVAL_DEPTH, MAX_EVAL_STEPS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default oracle query timeout in milliseconds
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 250;

/// Default cap on live oracle worker threads
pub const DEFAULT_ORACLE_MAX_WORKERS: usize = 16;

/// Default cap on oracle queries per decision
pub const DEFAULT_ORACLE_MAX_QUERIES: usize = 16;

/// Evaluation bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Deepest logic nesting evaluated
    pub max_depth: usize,
    /// Most node visits per decision
    pub max_steps: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_EVAL_DEPTH,
            max_steps: MAX_EVAL_STEPS,
        }
    }
}

/// Oracle query settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    /// Milliseconds to wait for an answer; `0` queries inline without a bound
    pub timeout_ms: u64,
    /// Worker threads alive at once, abandoned ones included
    pub max_workers: usize,
    /// Oracle queries a single decision may issue
    pub max_queries: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ORACLE_TIMEOUT_MS,
            max_workers: DEFAULT_ORACLE_MAX_WORKERS,
            max_queries: DEFAULT_ORACLE_MAX_QUERIES,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// `[evaluation]` section
    pub evaluation: EvaluationConfig,
    /// `[oracle]` section
    pub oracle: OracleConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    ///
    /// # Errors
    ///
    /// * `ConfigError::Parse` - malformed TOML or unknown fields
    /// * `ConfigError::Invalid` - a limit is zero
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` - the file cannot be read
    /// * plus everything [`parse`](Self::parse) reports
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` naming the first zero limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("evaluation.max_depth", self.evaluation.max_depth),
            ("evaluation.max_steps", self.evaluation.max_steps),
            ("oracle.max_workers", self.oracle.max_workers),
            ("oracle.max_queries", self.oracle.max_queries),
        ];
        match limits.into_iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError::Invalid {
                field,
                reason: "must be at least 1".into(),
            }),
            None => Ok(()),
        }
    }

    /// Evaluation limits
    #[must_use]
    pub fn limits(&self) -> EvalLimits {
        EvalLimits {
            max_depth: self.evaluation.max_depth,
            max_steps: self.evaluation.max_steps,
        }
    }

    /// Oracle timeout, `None` for inline queries
    #[must_use]
    pub fn oracle_timeout(&self) -> Option<Duration> {
        match self.oracle.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
