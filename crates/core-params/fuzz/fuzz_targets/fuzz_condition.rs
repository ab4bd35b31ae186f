//! Fuzz target for the condition parser (Anti-Stack Overflow)
//!
//! Any input must parse or fail cleanly. Whatever parses and compiles must
//! evaluate within the default bounds.

#![no_main]

use core_identity::{Entity, Resource, Role};
use core_params::{
    Condition, EvalContext, ExpressionEvaluator, FixedEnv, GrantRef, NoOracles, ParamSetRegistry,
    Word,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(condition) = Condition::parse(data) else {
        return;
    };
    let Ok(raw) = condition.compile() else {
        return;
    };

    let mut registry = ParamSetRegistry::new();
    let hash = registry.save(&raw);
    let env = FixedEnv::default();
    let args = [Word::ONE, Word::ZERO, Word::MAX];
    let ctx = EvalContext::new(
        Entity::from_low_u64(1),
        Resource::from_low_u64(2),
        Role::from_name("FUZZ"),
        &args,
    );

    // A compiled condition is a tree no deeper than the default bound
    let result = ExpressionEvaluator::new(&registry, &env, &NoOracles)
        .try_evaluate(GrantRef::Params(hash), &ctx);
    if condition.depth() <= core_params::MAX_EVAL_DEPTH
        && raw.len() <= core_params::MAX_EVAL_STEPS
    {
        assert!(result.is_ok(), "{condition} failed: {result:?}");
    }
});
