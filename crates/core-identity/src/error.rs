use thiserror::Error;

/// Errors raised while parsing identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid {kind} hex: {reason}")]
    InvalidHex { kind: &'static str, reason: String },

    #[error("Invalid {kind} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Specific Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
