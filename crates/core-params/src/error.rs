//! Error types for core-params

use thiserror::Error;

/// Result type alias for parameter authoring operations
pub type Result<T> = std::result::Result<T, ParamError>;

/// Errors raised while authoring or encoding parameter sets
///
/// Evaluation never surfaces these: a malformed stored tree evaluates to
/// `false` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// A word literal could not be parsed
    #[error("Invalid word: {0}")]
    InvalidWord(String),

    /// An operator name could not be parsed
    #[error("Unknown operator: {0}")]
    UnknownOp(String),

    /// A logic node points at a node that does not exist
    #[error("Node {node} references missing child {child}")]
    DanglingChild {
        /// Index of the logic node
        node: u32,
        /// Offending child index
        child: u32,
    },

    /// A logic node points at itself or at an earlier node
    #[error("Node {node} must reference children after itself (found {child})")]
    ChildNotForward {
        /// Index of the logic node
        node: u32,
        /// Offending child index
        child: u32,
    },

    /// Parameter set exceeds the maximum node count
    #[error("Parameter set exceeds maximum {max} nodes (attempted: {attempted})")]
    TooManyParams {
        /// Maximum allowed nodes
        max: usize,
        /// Attempted number of nodes
        attempted: usize,
    },

    /// Condition syntax error
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// Condition string is too long
    #[error("Condition exceeds maximum {max} characters (length: {length})")]
    ConditionTooLong {
        /// Maximum allowed length
        max: usize,
        /// Actual length
        length: usize,
    },

    /// Condition is nested too deeply
    #[error("Condition exceeds maximum nesting depth of {max}")]
    ConditionTooDeep {
        /// Maximum allowed depth
        max: usize,
    },
}

/// Reasons an evaluation was aborted
///
/// Both variants collapse to a deny at the decision layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// Recursion went deeper than the configured bound
    #[error("Evaluation exceeds maximum depth of {max}")]
    TooDeep {
        /// Maximum allowed depth
        max: usize,
    },

    /// More nodes were visited than the configured budget
    #[error("Evaluation exceeds step budget of {max} nodes")]
    StepBudgetExhausted {
        /// Maximum allowed node visits
        max: usize,
    },
}

/// Failures reported by an oracle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// No oracle answers at the referenced address
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle did not answer in time
    #[error("Oracle timed out after {ms} ms")]
    Timeout {
        /// Timeout that expired
        ms: u64,
    },

    /// The oracle answered with an error
    #[error("Oracle failed: {0}")]
    Failed(String),
}
