//! End-to-end tests: condition text -> compiled words -> evaluation

use core_identity::{Entity, Resource, Role};
use core_params::{
    Condition, EvalContext, ExpressionEvaluator, FixedEnv, GrantRef, NoOracles, ParamError,
    ParamSetRegistry, Word, MAX_CONDITION_LENGTH, MAX_EVAL_DEPTH,
};

struct Harness {
    registry: ParamSetRegistry,
    env: FixedEnv,
}

impl Harness {
    fn new(block_height: u64, timestamp: u64) -> Self {
        Self {
            registry: ParamSetRegistry::new(),
            env: FixedEnv {
                block_height,
                timestamp,
            },
        }
    }

    fn check(&mut self, condition: &str, caller: Entity, args: &[u64]) -> bool {
        let raw = Condition::parse(condition)
            .and_then(|c| c.compile())
            .unwrap_or_else(|e| panic!("{condition:?}: {e}"));
        let hash = self.registry.save(&raw);
        let args: Vec<Word> = args.iter().copied().map(Word::from).collect();
        let ctx = EvalContext::new(
            Entity::from_low_u64(0x100),
            Resource::from_low_u64(0x200),
            Role::from_name("TRANSFER"),
            &args,
        )
        .with_caller(caller);
        ExpressionEvaluator::new(&self.registry, &self.env, &NoOracles)
            .evaluate(GrantRef::Params(hash), &ctx)
    }
}

#[test]
fn test_amount_cap() {
    let mut h = Harness::new(0, 0);
    let me = Entity::from_low_u64(0x100);
    assert!(h.check("arg[0] <= 1000", me, &[1000]));
    assert!(!h.check("arg[0] <= 1000", me, &[1001]));
    assert!(!h.check("arg[0] <= 1000", me, &[]));
}

#[test]
fn test_time_window() {
    let mut h = Harness::new(0, 1_500);
    let me = Entity::from_low_u64(0x100);
    assert!(h.check("timestamp >= 1000 AND timestamp < 2000", me, &[]));
    assert!(!h.check("timestamp >= 1600 AND timestamp < 2000", me, &[]));
}

#[test]
fn test_block_height() {
    let mut h = Harness::new(42, 0);
    let me = Entity::from_low_u64(0x100);
    assert!(h.check("block == 42", me, &[]));
    assert!(h.check("block", me, &[]));
    assert!(!h.check("NOT block", me, &[]));
}

#[test]
fn test_caller_allow_list() {
    let mut h = Harness::new(0, 0);
    let condition = "caller == 0xa1 OR caller == 0xa2";
    assert!(h.check(condition, Entity::from_low_u64(0xa1), &[]));
    assert!(h.check(condition, Entity::from_low_u64(0xa2), &[]));
    assert!(!h.check(condition, Entity::from_low_u64(0xa3), &[]));
}

#[test]
fn test_if_else_tiers() {
    // Flagged accounts get a higher cap
    let condition = "IF arg[1] THEN arg[0] < 100 ELSE arg[0] < 10";
    let mut h = Harness::new(0, 0);
    let me = Entity::from_low_u64(0x100);
    assert!(h.check(condition, me, &[50, 1]));
    assert!(!h.check(condition, me, &[50, 0]));
    assert!(h.check(condition, me, &[5, 0]));
    assert!(!h.check(condition, me, &[150, 1]));
}

#[test]
fn test_xor() {
    let mut h = Harness::new(0, 0);
    let me = Entity::from_low_u64(0x100);
    assert!(h.check("arg[0] XOR arg[1]", me, &[1, 0]));
    assert!(h.check("arg[0] XOR arg[1]", me, &[0, 1]));
    assert!(!h.check("arg[0] XOR arg[1]", me, &[1, 1]));
    assert!(!h.check("arg[0] XOR arg[1]", me, &[0, 0]));
}

#[test]
fn test_oracle_without_gateway_denies() {
    let mut h = Harness::new(0, 0);
    let me = Entity::from_low_u64(0x100);
    let condition = format!("ORACLE 0x{}", "11".repeat(20));
    assert!(!h.check(&condition, me, &[]));
    assert!(h.check(&format!("NOT ({condition})"), me, &[]));
}

#[test]
fn test_identical_conditions_share_storage() {
    let mut h = Harness::new(0, 0);
    let me = Entity::from_low_u64(0x100);
    h.check("arg[0] == 1", me, &[1]);
    h.check("arg[0]  ==  1", me, &[1]);
    assert_eq!(h.registry.set_count(), 1);
    h.check("arg[0] == 2", me, &[1]);
    assert_eq!(h.registry.set_count(), 2);
}

#[test]
fn test_length_limit() {
    let padded = format!("TRUE{}", " ".repeat(MAX_CONDITION_LENGTH));
    assert!(matches!(
        Condition::parse(&padded),
        Err(ParamError::ConditionTooLong { .. })
    ));
}

#[test]
fn test_max_depth_compiles_and_evaluates() {
    let mut source = String::from("TRUE");
    for _ in 0..MAX_EVAL_DEPTH {
        source = format!("NOT {source}");
    }
    // An even number of NOTs
    let mut h = Harness::new(0, 0);
    let me = Entity::from_low_u64(0x100);
    assert_eq!(h.check(&source, me, &[]), MAX_EVAL_DEPTH % 2 == 0);

    let too_deep = format!("NOT {source}");
    let parsed = Condition::parse(&too_deep);
    assert!(matches!(
        parsed.and_then(|c| c.compile()),
        Err(ParamError::ConditionTooDeep { .. })
    ));
}
