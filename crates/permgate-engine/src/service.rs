//! Two-tier access decisions
//!
//! A request is allowed when the requesting entity's own grant evaluates to
//! true, or failing that, when the wildcard entity's grant does. The two
//! grants are created and revoked independently and combined by OR.

use crate::store::PermissionStore;
use crate::types::{AuthDecision, GrantTier};
use core_identity::{Entity, Resource, Role};
use core_params::{EvalContext, ExpressionEvaluator, Word};
use std::time::Instant;
use tracing::debug;

/// Read-only decision service over a store snapshot
///
/// Borrows the store and an evaluator for the duration of one or more
/// decisions; it never mutates anything.
pub struct AccessDecisionService<'a> {
    store: &'a PermissionStore,
    evaluator: ExpressionEvaluator<'a>,
}

impl<'a> AccessDecisionService<'a> {
    /// Create a service over a store and an evaluator bound to its registry
    #[must_use]
    pub fn new(store: &'a PermissionStore, evaluator: ExpressionEvaluator<'a>) -> Self {
        Self { store, evaluator }
    }

    /// Whether `who` may exercise `role` on `resource`, invoking as itself
    #[must_use]
    pub fn check(&self, who: Entity, resource: Resource, role: Role, args: &[Word]) -> bool {
        self.resolve(who, who, resource, role, args).is_some()
    }

    /// Whether `who` may exercise `role` on `resource` when `caller` is the
    /// immediate invoker seen by caller nodes
    #[must_use]
    pub fn check_from(
        &self,
        caller: Entity,
        who: Entity,
        resource: Resource,
        role: Role,
        args: &[Word],
    ) -> bool {
        self.resolve(caller, who, resource, role, args).is_some()
    }

    /// Like [`check_from`](Self::check_from) with the allowing tier and timing
    #[must_use]
    pub fn decide(
        &self,
        caller: Entity,
        who: Entity,
        resource: Resource,
        role: Role,
        args: &[Word],
    ) -> AuthDecision {
        let start = Instant::now();
        let tier = self.resolve(caller, who, resource, role, args);
        let evaluation_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        AuthDecision {
            allowed: tier.is_some(),
            tier,
            evaluation_time_us,
        }
    }

    fn resolve(
        &self,
        caller: Entity,
        who: Entity,
        resource: Resource,
        role: Role,
        args: &[Word],
    ) -> Option<GrantTier> {
        // Sentinels match grants, they never make requests
        if who.is_sentinel() || caller.is_sentinel() {
            debug!(%who, %caller, "sentinel entity in request, denying");
            return None;
        }

        let ctx = EvalContext::new(who, resource, role, args).with_caller(caller);

        if let Some(grant) = self.store.grant(&who, &resource, &role) {
            if self.evaluator.evaluate(grant, &ctx) {
                return Some(GrantTier::Direct);
            }
        }

        let wildcard = self.store.grant(&Entity::ANY, &resource, &role)?;
        if self.evaluator.evaluate(wildcard, &ctx.for_holder(Entity::ANY)) {
            return Some(GrantTier::Wildcard);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_params::{FixedEnv, GrantRef, NoOracles, Op, Param, ParamSetRegistry};

    const ROLE: &str = "MINT";

    struct Fixture {
        store: PermissionStore,
        registry: ParamSetRegistry,
        env: FixedEnv,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: PermissionStore::new(),
                registry: ParamSetRegistry::new(),
                env: FixedEnv::default(),
            }
        }

        fn grant(&mut self, entity: Entity, nodes: &[Param]) {
            let grant = if nodes.is_empty() {
                GrantRef::Unconditional
            } else {
                let raw: Vec<Word> = nodes.iter().map(Param::encode).collect();
                GrantRef::Params(self.registry.save(&raw))
            };
            self.store
                .set_grant(entity, resource(), Role::from_name(ROLE), Some(grant));
        }

        fn service(&self) -> AccessDecisionService<'_> {
            AccessDecisionService::new(
                &self.store,
                ExpressionEvaluator::new(&self.registry, &self.env, &NoOracles),
            )
        }
    }

    fn resource() -> Resource {
        Resource::from_low_u64(0xabc)
    }

    fn alice() -> Entity {
        Entity::from_low_u64(0xa11ce)
    }

    #[test]
    fn test_no_grant_denies() {
        let fixture = Fixture::new();
        assert!(!fixture
            .service()
            .check(alice(), resource(), Role::from_name(ROLE), &[]));
    }

    #[test]
    fn test_direct_tier() {
        let mut fixture = Fixture::new();
        fixture.grant(alice(), &[]);
        let decision =
            fixture
                .service()
                .decide(alice(), alice(), resource(), Role::from_name(ROLE), &[]);
        assert!(decision.allowed);
        assert_eq!(decision.tier, Some(GrantTier::Direct));
    }

    #[test]
    fn test_failing_direct_falls_through_to_wildcard() {
        let mut fixture = Fixture::new();
        fixture.grant(alice(), &[Param::literal(Op::Ret, 0u64)]);
        fixture.grant(Entity::ANY, &[]);
        let decision =
            fixture
                .service()
                .decide(alice(), alice(), resource(), Role::from_name(ROLE), &[]);
        assert_eq!(decision.tier, Some(GrantTier::Wildcard));
    }

    #[test]
    fn test_sentinel_requests_denied() {
        let mut fixture = Fixture::new();
        fixture.grant(Entity::ANY, &[]);
        let service = fixture.service();
        let role = Role::from_name(ROLE);
        assert!(service.check(alice(), resource(), role, &[]));
        assert!(!service.check(Entity::ANY, resource(), role, &[]));
        assert!(!service.check(Entity::BURN, resource(), role, &[]));
        assert!(!service.check_from(Entity::ANY, alice(), resource(), role, &[]));
    }
}
