//! # Parameter Set Evaluator
//!
//! Walks a stored parameter set from node 0 and decides whether a grant
//! applies to a request.
//!
//! ## Semantics
//!
//! - **Comparison nodes** resolve a left operand from the node's id (block
//!   height, timestamp, caller, oracle, literal or a caller argument) and
//!   compare it with the node's value using ==, !=, >, <, >=, <=.
//! - **RET nodes** return `operand > 0`.
//! - **Logic nodes** combine children: NOT, short-circuit AND and OR, XOR
//!   (both sides always evaluated) and IF_ELSE (exactly one branch).
//! - **Truncation**: every operand is narrowed to 240 bits before it is
//!   compared, the width of a node's value field.
//!
//! ## Failure policy
//!
//! A node that cannot be resolved evaluates to `false` where it stands: an
//! index past the end of the set, an argument index past the end of `args`,
//! an unknown operator, a failed oracle. The enclosing logic combines that
//! `false` like any other value.
//!
//! Exceeding the depth bound or the step budget aborts the whole evaluation
//! with an [`EvalError`], which [`ExpressionEvaluator::evaluate`] reports as
//! a deny. These bounds also stop cyclic child references.

use crate::env::ExecutionEnv;
use crate::error::EvalError;
use crate::oracle::{OracleGateway, OracleRef};
use crate::param::{Op, Operand, Param};
use crate::registry::{GrantRef, ParamSetRegistry};
use crate::word::Word;
use crate::{MAX_EVAL_DEPTH, MAX_EVAL_STEPS};
use core_identity::{Entity, ParamHash, Resource, Role};
use tracing::{debug, trace};

/// Bounds applied to a single evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    /// Deepest logic nesting allowed (node 0 is depth 0)
    pub max_depth: usize,
    /// Most node visits allowed in one evaluation
    pub max_steps: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            max_depth: MAX_EVAL_DEPTH,
            max_steps: MAX_EVAL_STEPS,
        }
    }
}

/// The request a parameter set is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Entity the grant was issued to (the wildcard for wildcard grants)
    pub who: Entity,
    /// Resource being accessed
    pub resource: Resource,
    /// Role being exercised
    pub role: Role,
    /// Caller-supplied arguments
    pub args: &'a [Word],
    /// Entity actually invoking the check
    pub caller: Entity,
}

impl<'a> EvalContext<'a> {
    /// Context where the invoker is `who` itself
    #[must_use]
    pub fn new(who: Entity, resource: Resource, role: Role, args: &'a [Word]) -> Self {
        Self {
            who,
            resource,
            role,
            args,
            caller: who,
        }
    }

    /// Override the invoking entity
    #[must_use]
    pub fn with_caller(mut self, caller: Entity) -> Self {
        self.caller = caller;
        self
    }

    /// Same request seen through a different grant holder
    #[must_use]
    pub fn for_holder(mut self, who: Entity) -> Self {
        self.who = who;
        self
    }
}

/// Evaluates grants against a registry, an environment and an oracle gateway
///
/// ## Example
///
/// ```
/// use core_identity::{Entity, Resource, Role};
/// use core_params::{
///     EvalContext, ExpressionEvaluator, FixedEnv, GrantRef, NoOracles, Op, Param,
///     ParamSetRegistry, Word,
/// };
///
/// let mut registry = ParamSetRegistry::new();
/// let hash = registry.save(&[Param::arg(0, Op::Eq, 5u64).encode()]);
///
/// let env = FixedEnv::default();
/// let evaluator = ExpressionEvaluator::new(&registry, &env, &NoOracles);
///
/// let args = [Word::from(5u64)];
/// let ctx = EvalContext::new(
///     Entity::from_low_u64(1),
///     Resource::from_low_u64(2),
///     Role::from_name("ROLE"),
///     &args,
/// );
/// assert!(evaluator.evaluate(GrantRef::Params(hash), &ctx));
/// assert!(evaluator.evaluate(GrantRef::Unconditional, &ctx));
/// ```
pub struct ExpressionEvaluator<'a> {
    registry: &'a ParamSetRegistry,
    env: &'a dyn ExecutionEnv,
    oracles: &'a dyn OracleGateway,
    limits: EvalLimits,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create an evaluator with default limits
    #[must_use]
    pub fn new(
        registry: &'a ParamSetRegistry,
        env: &'a dyn ExecutionEnv,
        oracles: &'a dyn OracleGateway,
    ) -> Self {
        Self {
            registry,
            env,
            oracles,
            limits: EvalLimits::default(),
        }
    }

    /// Replace the evaluation limits
    #[must_use]
    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits in effect
    #[must_use]
    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    /// Decide whether `grant` allows the request in `ctx`
    ///
    /// Never fails: an aborted evaluation is a deny.
    #[must_use]
    pub fn evaluate(&self, grant: GrantRef, ctx: &EvalContext<'_>) -> bool {
        match self.try_evaluate(grant, ctx) {
            Ok(allowed) => allowed,
            Err(err) => {
                debug!(
                    who = %ctx.who,
                    resource = %ctx.resource,
                    error = %err,
                    "parameter evaluation aborted, denying"
                );
                false
            }
        }
    }

    /// Like [`evaluate`](Self::evaluate) but reports why an evaluation aborted
    ///
    /// # Errors
    ///
    /// * `EvalError::TooDeep` - logic nesting exceeded `max_depth`
    /// * `EvalError::StepBudgetExhausted` - more than `max_steps` nodes visited
    pub fn try_evaluate(&self, grant: GrantRef, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        match grant {
            GrantRef::Unconditional => Ok(true),
            GrantRef::Params(hash) => {
                let mut steps = 0;
                self.eval_node(&hash, 0, ctx, 0, &mut steps)
            }
        }
    }

    fn eval_node(
        &self,
        hash: &ParamHash,
        index: u32,
        ctx: &EvalContext<'_>,
        depth: usize,
        steps: &mut usize,
    ) -> Result<bool, EvalError> {
        if depth > self.limits.max_depth {
            return Err(EvalError::TooDeep {
                max: self.limits.max_depth,
            });
        }
        *steps += 1;
        if *steps > self.limits.max_steps {
            return Err(EvalError::StepBudgetExhausted {
                max: self.limits.max_steps,
            });
        }

        let Some(param) = self.registry.get(hash, index) else {
            trace!(index, "node index out of bounds");
            return Ok(false);
        };

        let (value, compared_to) = match param.source() {
            Operand::Logic => return self.eval_logic(hash, &param, ctx, depth, steps),
            Operand::Oracle => {
                let oracle = OracleRef::from_word(param.value);
                let allowed =
                    self.oracles
                        .can_perform(oracle, &ctx.who, &ctx.resource, &ctx.role, ctx.args);
                (Word::from(allowed), Word::ONE)
            }
            Operand::BlockHeight => (Word::from(self.env.block_height()), param.value),
            Operand::Timestamp => (Word::from(self.env.timestamp()), param.value),
            Operand::Caller => (Word::from(ctx.caller), param.value),
            Operand::Literal => (param.value, param.value),
            Operand::Argument(arg) => match ctx.args.get(usize::from(arg)) {
                Some(value) => (*value, param.value),
                None => {
                    trace!(arg, len = ctx.args.len(), "argument index out of bounds");
                    return Ok(false);
                }
            },
        };

        let value = value.truncate_to_value();
        let compared_to = compared_to.truncate_to_value();

        if param.op == Op::Ret {
            return Ok(!value.is_zero());
        }

        Ok(compare(value, param.op, compared_to))
    }

    fn eval_logic(
        &self,
        hash: &ParamHash,
        param: &Param,
        ctx: &EvalContext<'_>,
        depth: usize,
        steps: &mut usize,
    ) -> Result<bool, EvalError> {
        let [first, second, third] = param.children();
        let next = depth + 1;

        match param.op {
            Op::IfElse => {
                let condition = self.eval_node(hash, first, ctx, next, steps)?;
                let branch = if condition { second } else { third };
                self.eval_node(hash, branch, ctx, next, steps)
            }
            Op::Not => Ok(!self.eval_node(hash, first, ctx, next, steps)?),
            Op::And => {
                // Short-circuit: the right child is never visited on a false left
                if !self.eval_node(hash, first, ctx, next, steps)? {
                    return Ok(false);
                }
                self.eval_node(hash, second, ctx, next, steps)
            }
            Op::Or => {
                if self.eval_node(hash, first, ctx, next, steps)? {
                    return Ok(true);
                }
                self.eval_node(hash, second, ctx, next, steps)
            }
            Op::Xor => {
                let left = self.eval_node(hash, first, ctx, next, steps)?;
                let right = self.eval_node(hash, second, ctx, next, steps)?;
                Ok(left ^ right)
            }
            op => {
                trace!(%op, "unknown logic operator");
                Ok(false)
            }
        }
    }
}

/// Apply a comparison operator; anything that is not a comparison is false
fn compare(value: Word, op: Op, compared_to: Word) -> bool {
    match op {
        Op::Eq => value == compared_to,
        Op::Neq => value != compared_to,
        Op::Gt => value > compared_to,
        Op::Lt => value < compared_to,
        Op::Gte => value >= compared_to,
        Op::Lte => value <= compared_to,
        _ => false,
    }
}
