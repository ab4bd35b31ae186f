// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # core-identity
//!
//! Opaque identifiers used throughout permgate.
//!
//! - [`Entity`]: a 20-byte actor identity, with the reserved
//!   [`Entity::ANY`] wildcard and [`Entity::BURN`] sentinels
//! - [`Resource`]: a 20-byte protected target
//! - [`Role`]: a 32-byte action category, derivable from a name
//! - [`ParamHash`]: the content address of a stored parameter set
//!
//! All identifiers render and parse as `0x`-prefixed hex and serialize as
//! hex strings, so they can appear verbatim in TOML fixtures.
//!
//! ## Example
//!
//! ```
//! use core_identity::{Entity, Resource, Role};
//!
//! let who: Entity = "0x00000000000000000000000000000000000000aa".parse().unwrap();
//! let app = Resource::from_low_u64(0xb0b);
//! let role = Role::from_name("TRANSFER_ROLE");
//!
//! assert!(!who.is_wildcard());
//! assert_eq!(app.to_hex().len(), 2 + 40);
//! assert_eq!(role.as_bytes().len(), 32);
//! ```

#![forbid(unsafe_code)]

mod error;
pub mod digest;
mod ids;

pub use error::{IdentityError, Result};
pub use ids::{Entity, ParamHash, Resource, Role};
