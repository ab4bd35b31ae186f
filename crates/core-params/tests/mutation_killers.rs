//! Mutation Testing Kill Tests
//!
//! Boundary tests for the evaluation bounds and the operand codec. Each test
//! pins one comparison or increment so an off-by-one mutant fails it.
//!
//! Run: cargo test --test mutation_killers

use core_identity::{Entity, Resource, Role};
use core_params::{
    EvalContext, EvalError, ExpressionEvaluator, FixedEnv, GrantRef, NoOracles, Op, Param,
    ParamBuilder, ParamError, ParamSetRegistry, Word, MAX_EVAL_DEPTH, MAX_EVAL_STEPS,
    MAX_PARAMS_PER_SET,
};

fn run(nodes: &[Param], args: &[Word]) -> Result<bool, EvalError> {
    let mut registry = ParamSetRegistry::new();
    let raw: Vec<Word> = nodes.iter().map(Param::encode).collect();
    let hash = registry.save(&raw);
    let env = FixedEnv::default();
    let ctx = EvalContext::new(
        Entity::from_low_u64(1),
        Resource::from_low_u64(2),
        Role::from_name("KILL"),
        args,
    );
    ExpressionEvaluator::new(&registry, &env, &NoOracles).try_evaluate(GrantRef::Params(hash), &ctx)
}

/// `levels` NOT nodes followed by a true leaf at depth `levels`
fn not_chain(levels: u32) -> Vec<Param> {
    let mut nodes: Vec<Param> = (0..levels).map(|i| Param::not(i + 1)).collect();
    nodes.push(Param::literal(Op::Ret, 1u64));
    nodes
}

// ============================================================================
// KILL: depth > max -> depth >= max
// ============================================================================

/// A leaf at exactly MAX_EVAL_DEPTH is allowed
#[test]
fn kill_depth_boundary_inclusive() {
    let nodes = not_chain(MAX_EVAL_DEPTH as u32);
    let expected = MAX_EVAL_DEPTH % 2 == 0;
    assert_eq!(run(&nodes, &[]), Ok(expected));
}

/// One level deeper aborts with TooDeep
#[test]
fn kill_depth_boundary_exceeded() {
    let nodes = not_chain(MAX_EVAL_DEPTH as u32 + 1);
    let result = run(&nodes, &[]);
    assert!(
        matches!(result, Err(EvalError::TooDeep { max }) if max == MAX_EVAL_DEPTH),
        "Expected TooDeep, got {:?}",
        result
    );
}

// ============================================================================
// KILL: depth + 1 -> depth * 1 (depth would stay 0)
// ============================================================================

#[test]
fn kill_depth_increment_in_every_logic_op() {
    let depth = MAX_EVAL_DEPTH as u32 + 1;
    // Every level uses the given op with its recursive child first
    let chains: [(&str, fn(u32) -> Param); 4] = [
        ("AND", |next| Param::and(next, next)),
        ("OR", |next| Param::or(next, next)),
        ("XOR", |next| Param::logic(Op::Xor, [next, next, 0])),
        ("IF_ELSE", |next| Param::if_else(next, next, next)),
    ];

    for (name, make) in chains {
        // node i -> node i+1, one level per node
        let mut nodes: Vec<Param> = (0..depth).map(|i| make(i + 1)).collect();
        nodes.push(Param::literal(Op::Ret, 1u64));
        let result = run(&nodes, &[]);
        assert!(
            matches!(
                result,
                Err(EvalError::TooDeep { .. }) | Err(EvalError::StepBudgetExhausted { .. })
            ),
            "{}: expected a bound error, got {:?}",
            name,
            result
        );
    }
}

// ============================================================================
// KILL: steps > max -> steps >= max, and a missing increment
// ============================================================================

#[test]
fn kill_step_budget_boundary() {
    fn and_chain(visits: usize) -> Vec<Param> {
        // AND(lit1, AND(lit1, ... lit1)): each AND adds 2 visits
        assert!(visits % 2 == 1);
        let ands = (visits - 1) / 2;
        let mut nodes = Vec::new();
        for i in 0..ands as u32 {
            nodes.push(Param::and(2 * i + 1, 2 * i + 2));
            nodes.push(Param::literal(Op::Ret, 1u64));
        }
        nodes.push(Param::literal(Op::Ret, 1u64));
        nodes
    }

    let mut registry = ParamSetRegistry::new();
    let env = FixedEnv::default();
    let ctx = EvalContext::new(
        Entity::from_low_u64(1),
        Resource::from_low_u64(2),
        Role::from_name("KILL"),
        &[],
    );

    let exact = and_chain(9);
    let raw: Vec<Word> = exact.iter().map(Param::encode).collect();
    let hash = registry.save(&raw);

    let at_limit = ExpressionEvaluator::new(&registry, &env, &NoOracles).with_limits(
        core_params::EvalLimits {
            max_depth: MAX_EVAL_DEPTH,
            max_steps: 9,
        },
    );
    assert_eq!(at_limit.try_evaluate(GrantRef::Params(hash), &ctx), Ok(true));

    let below_limit = ExpressionEvaluator::new(&registry, &env, &NoOracles).with_limits(
        core_params::EvalLimits {
            max_depth: MAX_EVAL_DEPTH,
            max_steps: 8,
        },
    );
    assert_eq!(
        below_limit.try_evaluate(GrantRef::Params(hash), &ctx),
        Err(EvalError::StepBudgetExhausted { max: 8 })
    );
}

#[test]
fn kill_default_step_budget_value() {
    // 2^9 - 1 = 511 visits for a full XOR tree of height 8 exceeds 256
    let levels = 8u32;
    let mut nodes: Vec<Param> = (0..levels).map(|i| Param::xor(i + 1, i + 1)).collect();
    nodes.push(Param::literal(Op::Ret, 1u64));
    assert_eq!(
        run(&nodes, &[]),
        Err(EvalError::StepBudgetExhausted {
            max: MAX_EVAL_STEPS
        })
    );

    // Height 7: 255 visits fits
    let levels = 7u32;
    let mut nodes: Vec<Param> = (0..levels).map(|i| Param::xor(i + 1, i + 1)).collect();
    nodes.push(Param::literal(Op::Ret, 1u64));
    assert_eq!(run(&nodes, &[]), Ok(false));
}

// ============================================================================
// KILL: comparison swaps (> vs >=, < vs <=)
// ============================================================================

#[test]
fn kill_comparison_boundaries() {
    let ten = [Word::from(10u64)];
    assert_eq!(run(&[Param::arg(0, Op::Gt, 10u64)], &ten), Ok(false));
    assert_eq!(run(&[Param::arg(0, Op::Gte, 10u64)], &ten), Ok(true));
    assert_eq!(run(&[Param::arg(0, Op::Lt, 10u64)], &ten), Ok(false));
    assert_eq!(run(&[Param::arg(0, Op::Lte, 10u64)], &ten), Ok(true));
    assert_eq!(run(&[Param::arg(0, Op::Gt, 9u64)], &ten), Ok(true));
    assert_eq!(run(&[Param::arg(0, Op::Lt, 11u64)], &ten), Ok(true));
}

// ============================================================================
// KILL: argument bounds check (index < len -> index <= len)
// ============================================================================

#[test]
fn kill_argument_index_equal_to_len() {
    let args = [Word::ONE, Word::ONE];
    assert_eq!(run(&[Param::arg(1, Op::Ret, 0u64)], &args), Ok(true));
    assert_eq!(run(&[Param::arg(2, Op::Ret, 0u64)], &args), Ok(false));
}

// ============================================================================
// KILL: MAX_PARAMS_PER_SET boundary (> vs >=)
// ============================================================================

#[test]
fn kill_param_count_boundary() {
    let leaf = Param::literal(Op::Ret, 1u64);
    let exact = ParamBuilder::new()
        .nodes(std::iter::repeat(leaf).take(MAX_PARAMS_PER_SET))
        .build();
    assert!(exact.is_ok());

    let over = ParamBuilder::new()
        .nodes(std::iter::repeat(leaf).take(MAX_PARAMS_PER_SET + 1))
        .build();
    assert!(matches!(
        over,
        Err(ParamError::TooManyParams { max, attempted })
            if max == MAX_PARAMS_PER_SET && attempted == MAX_PARAMS_PER_SET + 1
    ));
}

// ============================================================================
// KILL: truncation width (240 bits)
// ============================================================================

#[test]
fn kill_truncation_keeps_bit_239() {
    let mut bytes = [0u8; 32];
    bytes[2] = 0x80; // bit 239, the top of the value field
    let word = Word::from_be_bytes(bytes);
    assert_eq!(word.truncate_to_value(), word);
    assert_eq!(run(&[Param::arg(0, Op::Ret, 0u64)], &[word]), Ok(true));

    bytes[1] = 0x01; // bit 240 is dropped
    let wide = Word::from_be_bytes(bytes);
    assert_eq!(wide.truncate_to_value(), word);
}
