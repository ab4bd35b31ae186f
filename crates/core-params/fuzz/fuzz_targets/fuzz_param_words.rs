//! Fuzz target for the parameter set evaluator
//!
//! Arbitrary bytes are cut into 32-byte words and stored as a parameter set.
//! Cyclic child references, dangling indices and unknown operators must all
//! end in a bool or a bound error, never a panic or a stack overflow.

#![no_main]

use core_identity::{Entity, Resource, Role};
use core_params::{
    EvalContext, EvalError, ExpressionEvaluator, FixedEnv, GrantRef, NoOracles, ParamSetRegistry,
    Word, MAX_EVAL_DEPTH, MAX_EVAL_STEPS,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let words: Vec<Word> = data
        .chunks_exact(32)
        .map(|chunk| {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(chunk);
            Word::from_be_bytes(bytes)
        })
        .collect();

    // First quarter doubles as arguments
    let args = &words[..words.len() / 4];

    let mut registry = ParamSetRegistry::new();
    let hash = registry.save(&words);
    let env = FixedEnv {
        block_height: 1,
        timestamp: 2,
    };
    let ctx = EvalContext::new(
        Entity::from_low_u64(1),
        Resource::from_low_u64(2),
        Role::from_name("FUZZ"),
        args,
    );

    match ExpressionEvaluator::new(&registry, &env, &NoOracles)
        .try_evaluate(GrantRef::Params(hash), &ctx)
    {
        Ok(_) => {}
        Err(EvalError::TooDeep { max }) => assert_eq!(max, MAX_EVAL_DEPTH),
        Err(EvalError::StepBudgetExhausted { max }) => assert_eq!(max, MAX_EVAL_STEPS),
    }
});
