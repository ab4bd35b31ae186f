// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # permgate
//!
//! Authorization with parameterized permissions.
//!
//! A grant lets an entity exercise a role on a resource either
//! unconditionally or when a stored expression tree evaluates to true
//! against the request: arguments, block height, timestamp, the invoking
//! caller and external oracles.
//!
//! ## Quick Start
//!
//! ```rust
//! use permgate::identity::{Entity, Resource, Role};
//! use permgate::params::{Condition, Word};
//! use permgate::engine::PermissionEngine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = PermissionEngine::default();
//! let admin = Entity::from_low_u64(1);
//! let alice = Entity::from_low_u64(2);
//! let vault = Resource::from_low_u64(3);
//! let withdraw = Role::from_name("WITHDRAW");
//!
//! engine.manager().create(admin, vault, withdraw, admin)?;
//!
//! let limit = Condition::parse("arg[0] <= 1000")?.compile()?;
//! engine.manager().grant(admin, alice, vault, withdraw, &limit)?;
//!
//! assert!(engine.check(alice, vault, withdraw, &[Word::from(500u64)]));
//! assert!(!engine.check(alice, vault, withdraw, &[Word::from(5000u64)]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! This facade crate re-exports the following modules:
//!
//! - [`identity`] - Fixed-width identifiers and hashing (from `core-identity`)
//! - [`params`] - Node codec, parameter storage and evaluator (from `core-params`)
//! - [`engine`] - Permission state, decisions and management (from `permgate-engine`)
//!
//! ## Security
//!
//! - Decisions are fail-closed: malformed trees, missing arguments and
//!   unavailable oracles deny
//! - Evaluation is bounded in depth (32) and node visits (256)
//! - Oracle queries are isolated from panics and bounded by a timeout

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Identifier module.
///
/// Re-exports `core_identity` for entities, resources, roles and hashes.
pub mod identity {
    pub use core_identity::*;
}

/// Parameter module.
///
/// Re-exports `core_params` for encoding, storing and evaluating conditions.
pub mod params {
    pub use core_params::*;
}

/// Engine module.
///
/// Re-exports `permgate_engine` for decisions and the management API.
pub mod engine {
    pub use permgate_engine::*;
}

// Convenience re-exports at root level
pub use core_identity::{Entity, Resource, Role};
pub use core_params::{Condition, Word};
pub use permgate_engine::{PermissionEngine, PermissionError};
