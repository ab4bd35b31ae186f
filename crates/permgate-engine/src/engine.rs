//! The engine: one lock around all permission state
//!
//! Decisions hold the read guard for their whole duration, so each one sees
//! a single snapshot of grants and parameter sets. Mutations take the write
//! guard, which serializes them across every (resource, role) key. A thread
//! evaluating a decision, and any oracle worker it starts, cannot touch the
//! state of the engine it decides for.

use crate::config::EngineConfig;
use crate::env::SystemEnv;
use crate::error::{PermissionError, Result};
use crate::events::{EventSink, PermissionEvent, TracingSink};
use crate::manager::PermissionManager;
use crate::oracle::OracleRegistry;
use crate::scope;
use crate::service::AccessDecisionService;
use crate::store::PermissionStore;
use crate::types::AuthDecision;
use core_identity::{Entity, Resource, Role};
use core_params::{
    EvalLimits, ExecutionEnv, ExpressionEvaluator, Oracle, OracleRef, ParamSetRegistry, Word,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Everything a decision reads, guarded together
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) store: PermissionStore,
    pub(crate) registry: ParamSetRegistry,
}

/// Thread-safe permission engine
///
/// ## Example
///
/// ```
/// use core_identity::{Entity, Resource, Role};
/// use core_params::{Op, Param, Word};
/// use permgate_engine::PermissionEngine;
///
/// # fn example() -> Result<(), permgate_engine::PermissionError> {
/// let engine = PermissionEngine::default();
/// let manager = Entity::from_low_u64(0xa);
/// let user = Entity::from_low_u64(0xb);
/// let app = Resource::from_low_u64(0xc);
/// let role = Role::from_name("TRANSFER");
///
/// engine.manager().create(manager, app, role, manager)?;
/// engine
///     .manager()
///     .grant(manager, user, app, role, &[Param::arg(0, Op::Lte, 100u64).encode()])?;
///
/// assert!(engine.check(user, app, role, &[Word::from(50u64)]));
/// assert!(!engine.check(user, app, role, &[Word::from(500u64)]));
/// # Ok(())
/// # }
/// ```
pub struct PermissionEngine {
    id: u64,
    state: RwLock<EngineState>,
    oracles: OracleRegistry,
    env: Box<dyn ExecutionEnv>,
    limits: EvalLimits,
    sink: Arc<dyn EventSink>,
}

impl PermissionEngine {
    /// Engine with configured limits, a [`SystemEnv`] and a [`TracingSink`]
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            id: scope::next_engine_id(),
            state: RwLock::new(EngineState::default()),
            oracles: OracleRegistry::new(config.oracle_timeout())
                .with_max_workers(config.oracle.max_workers)
                .with_max_queries(config.oracle.max_queries),
            env: Box::new(SystemEnv::default()),
            limits: config.limits(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the execution environment
    #[must_use]
    pub fn with_env(mut self, env: impl ExecutionEnv + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Replace the event sink
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Install an oracle, returning the one it replaces
    pub fn register_oracle(
        &self,
        oracle_ref: OracleRef,
        oracle: Arc<dyn Oracle>,
    ) -> Option<Arc<dyn Oracle>> {
        self.oracles.register(oracle_ref, oracle)
    }

    /// Registered oracles
    #[must_use]
    pub fn oracles(&self) -> &OracleRegistry {
        &self.oracles
    }

    /// Evaluation limits in effect
    #[must_use]
    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    /// Management API
    #[must_use]
    pub fn manager(&self) -> PermissionManager<'_> {
        PermissionManager::new(self)
    }

    /// Whether `who` may exercise `role` on `resource`
    #[must_use]
    pub fn check(&self, who: Entity, resource: Resource, role: Role, args: &[Word]) -> bool {
        self.decide(who, who, resource, role, args).allowed
    }

    /// Whether `who` may exercise `role` on `resource`, with `caller` as the
    /// immediate invoker
    #[must_use]
    pub fn check_from(
        &self,
        caller: Entity,
        who: Entity,
        resource: Resource,
        role: Role,
        args: &[Word],
    ) -> bool {
        self.decide(caller, who, resource, role, args).allowed
    }

    /// Full decision with the allowing tier and timing
    #[must_use]
    pub fn decide(
        &self,
        caller: Entity,
        who: Entity,
        resource: Resource,
        role: Role,
        args: &[Word],
    ) -> AuthDecision {
        if scope::is_active(self.id) {
            warn!(%who, %resource, %role, "decision requested from inside a decision, denying");
            return AuthDecision::denied(0);
        }
        let Ok(state) = self.state.read() else {
            warn!(%who, %resource, %role, "permission state poisoned, denying");
            return AuthDecision::denied(0);
        };
        let _scope = scope::enter(&[self.id]);
        let oracles = self.oracles.for_decision();
        let evaluator = ExpressionEvaluator::new(&state.registry, self.env.as_ref(), &oracles)
            .with_limits(self.limits);
        AccessDecisionService::new(&state.store, evaluator)
            .decide(caller, who, resource, role, args)
    }

    pub(crate) fn read_state(&self) -> Result<RwLockReadGuard<'_, EngineState>> {
        self.ensure_outside_decision()?;
        self.state.read().map_err(|_| PermissionError::StorePoisoned)
    }

    pub(crate) fn write_state(&self) -> Result<RwLockWriteGuard<'_, EngineState>> {
        self.ensure_outside_decision()?;
        self.state.write().map_err(|_| PermissionError::StorePoisoned)
    }

    fn ensure_outside_decision(&self) -> Result<()> {
        if scope::is_active(self.id) {
            warn!("permission state accessed during a decision, refusing");
            return Err(PermissionError::ReentrantAccess);
        }
        Ok(())
    }

    pub(crate) fn publish(&self, events: &[PermissionEvent]) {
        for event in events {
            self.sink.publish(event);
        }
    }
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl std::fmt::Debug for PermissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEngine")
            .field("oracles", &self.oracles)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
