//! Error types for the management API and configuration

use core_identity::{Entity, Resource, Role};
use thiserror::Error;

/// Result type alias for management operations
pub type Result<T> = std::result::Result<T, PermissionError>;

/// Errors returned by [`PermissionManager`](crate::PermissionManager)
///
/// Every variant rejects the operation outright; no state is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The permission or grant already exists
    #[error("Permission already exists: {role} on {resource} for {entity}")]
    PermissionAlreadyExists {
        /// Entity the operation targeted
        entity: Entity,
        /// Resource the operation targeted
        resource: Resource,
        /// Role the operation targeted
        role: Role,
    },

    /// No grant to revoke
    #[error("Permission not found: {role} on {resource} for {entity}")]
    PermissionNotFound {
        /// Entity the operation targeted
        entity: Entity,
        /// Resource the operation targeted
        resource: Resource,
        /// Role the operation targeted
        role: Role,
    },

    /// The caller is not the current manager
    #[error("Unauthorized: {caller} does not manage {role} on {resource}")]
    Unauthorized {
        /// Entity that attempted the operation
        caller: Entity,
        /// Resource the operation targeted
        resource: Resource,
        /// Role the operation targeted
        role: Role,
    },

    /// Parameter set exceeds maximum node count (DoS prevention)
    #[error("Parameter set exceeds maximum {max} nodes (attempted: {attempted})")]
    TooManyParams {
        /// Maximum allowed nodes
        max: usize,
        /// Attempted number of nodes
        attempted: usize,
    },

    /// A writer panicked while holding the state lock
    #[error("Permission state is poisoned")]
    StorePoisoned,

    /// Permission state was accessed from inside one of its own decisions,
    /// such as by an oracle
    #[error("Permission state accessed during a decision")]
    ReentrantAccess,
}

/// Errors loading an [`EngineConfig`](crate::EngineConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the config schema
    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
