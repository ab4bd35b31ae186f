// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

//! # core-params
//!
//! Parameterized permission conditions: encoding, storage and evaluation.
//!
//! This crate provides:
//! - The 256-bit node codec ([`Param`], [`Op`], [`Word`])
//! - Content-addressed, write-once storage ([`ParamSetRegistry`])
//! - The fail-closed evaluator ([`ExpressionEvaluator`])
//! - Capability traits for oracles ([`Oracle`], [`OracleGateway`]) and
//!   ambient values ([`ExecutionEnv`])
//! - Authoring helpers ([`ParamBuilder`], [`Condition`])
//!
//! ## Security
//!
//! - **Bounded evaluation**: recursion depth and node visits are capped
//!   - MAX_EVAL_DEPTH = 32
//!   - MAX_EVAL_STEPS = 256
//! - **Bounded storage**: MAX_PARAMS_PER_SET = 256 nodes per set
//! - **Fail-closed**: malformed sets, missing arguments, unknown operators
//!   and unavailable oracles all evaluate to `false`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod condition;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod oracle;
pub mod param;
pub mod registry;
pub mod word;

pub use builder::ParamBuilder;
pub use condition::{Condition, Source, MAX_CONDITION_LENGTH};
pub use env::{ExecutionEnv, FixedEnv};
pub use error::{EvalError, OracleError, ParamError, Result};
pub use evaluator::{EvalContext, EvalLimits, ExpressionEvaluator};
pub use oracle::{NoOracles, Oracle, OracleGateway, OracleRef};
pub use param::{Op, Operand, Param};
pub use registry::{hash_words, GrantRef, ParamSetRegistry};
pub use word::{Word, VALUE_BITS};

/// Maximum nesting depth of logic nodes (stack overflow prevention)
pub const MAX_EVAL_DEPTH: usize = 32;

/// Maximum node visits per evaluation (DoS prevention)
pub const MAX_EVAL_STEPS: usize = 256;

/// Maximum nodes per parameter set (DoS prevention)
pub const MAX_PARAMS_PER_SET: usize = 256;
