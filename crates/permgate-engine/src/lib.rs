// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # permgate-engine
//!
//! Permission state, two-tier access decisions and the management API.
//!
//! This crate provides:
//! - [`PermissionEngine`]: the thread-safe entry point owning all state
//! - [`AccessDecisionService`]: direct grant, then wildcard grant
//! - [`PermissionManager`]: create, grant, revoke and re-delegate
//! - [`OracleRegistry`]: oracle lookup with panic isolation and a timeout
//! - [`EngineConfig`]: TOML configuration of limits and timeouts
//! - [`PermissionEvent`] and [`EventSink`]: mutation notifications
//!
//! ## Security
//!
//! - **Fail-closed decisions**: every evaluation problem is a deny
//! - **Strict management**: unauthorized or conflicting writes are rejected
//!   with no partial effect
//! - **No re-entry**: oracles cannot read or change the permissions of the
//!   decision that consulted them
//! - **Sentinels never act**: [`Entity::ANY`](core_identity::Entity::ANY) and
//!   [`Entity::BURN`](core_identity::Entity::BURN) are never authorized as
//!   requesters or managers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod env;
mod error;
mod events;
mod manager;
mod oracle;
mod scope;
mod service;
mod store;
mod types;

pub use config::{
    EngineConfig, EvaluationConfig, OracleConfig, DEFAULT_ORACLE_MAX_QUERIES,
    DEFAULT_ORACLE_MAX_WORKERS, DEFAULT_ORACLE_TIMEOUT_MS,
};
pub use engine::PermissionEngine;
pub use env::SystemEnv;
pub use error::{ConfigError, PermissionError, Result};
pub use events::{EventSink, MemorySink, PermissionEvent, TracingSink};
pub use manager::PermissionManager;
pub use oracle::OracleRegistry;
pub use service::AccessDecisionService;
pub use store::PermissionStore;
pub use types::{AuthDecision, GrantTier};
