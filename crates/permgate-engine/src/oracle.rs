//! Oracle registry with panic isolation and a bounded wait
//!
//! Each query runs on a short-lived worker thread and the evaluator waits at
//! most the configured timeout for its answer. An oracle that errors, panics
//! or does not answer in time counts as `false`. A timed-out worker is left
//! to finish on its own and its late answer is discarded; at most
//! `max_workers` of them are alive at once, and a query finding every slot
//! taken is denied without spawning. Each decision may ask at most
//! `max_queries` oracles.

use crate::config::{DEFAULT_ORACLE_MAX_QUERIES, DEFAULT_ORACLE_MAX_WORKERS};
use crate::scope;
use core_identity::{Entity, Resource, Role};
use core_params::{Oracle, OracleGateway, OracleRef, Word};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Oracles addressed by [`OracleRef`]
pub struct OracleRegistry {
    oracles: RwLock<BTreeMap<OracleRef, Arc<dyn Oracle>>>,
    timeout: Option<Duration>,
    max_workers: usize,
    max_queries: usize,
    in_flight: Arc<AtomicUsize>,
}

impl OracleRegistry {
    /// Registry waiting at most `timeout` per query (`None` queries inline)
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            oracles: RwLock::new(BTreeMap::new()),
            timeout,
            max_workers: DEFAULT_ORACLE_MAX_WORKERS,
            max_queries: DEFAULT_ORACLE_MAX_QUERIES,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cap the worker threads alive at once, timed-out ones included
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Cap the oracle queries a single decision may issue
    #[must_use]
    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        self.max_queries = max_queries;
        self
    }

    /// Install an oracle, returning the one it replaces
    pub fn register(
        &self,
        oracle_ref: OracleRef,
        oracle: Arc<dyn Oracle>,
    ) -> Option<Arc<dyn Oracle>> {
        self.oracles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(oracle_ref, oracle)
    }

    /// Remove an oracle; later queries to it answer `false`
    pub fn unregister(&self, oracle_ref: &OracleRef) -> Option<Arc<dyn Oracle>> {
        self.oracles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(oracle_ref)
    }

    /// Number of registered oracles
    #[must_use]
    pub fn len(&self) -> usize {
        self.oracles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no oracle is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured wait per query
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Most worker threads alive at once
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Most oracle queries per decision
    #[must_use]
    pub fn max_queries(&self) -> usize {
        self.max_queries
    }

    /// Worker threads currently alive, including abandoned ones
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Gateway for one decision, counting its queries
    pub(crate) fn for_decision(&self) -> DecisionOracles<'_> {
        DecisionOracles {
            registry: self,
            remaining: Cell::new(self.max_queries),
        }
    }

    fn lookup(&self, oracle_ref: &OracleRef) -> Option<Arc<dyn Oracle>> {
        self.oracles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(oracle_ref)
            .cloned()
    }

    fn acquire_worker(&self) -> Option<WorkerSlot> {
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_workers).then_some(n + 1)
            })
            .ok()?;
        Some(WorkerSlot(Arc::clone(&self.in_flight)))
    }

    fn query_inline(
        oracle: &dyn Oracle,
        who: &Entity,
        resource: &Resource,
        role: &Role,
        args: &[Word],
    ) -> Option<bool> {
        match catch_unwind(AssertUnwindSafe(|| {
            oracle.can_perform(who, resource, role, args)
        })) {
            Ok(Ok(allowed)) => Some(allowed),
            Ok(Err(err)) => {
                warn!(error = %err, "oracle query failed");
                None
            }
            Err(_) => {
                warn!("oracle panicked");
                None
            }
        }
    }

    fn query_bounded(
        &self,
        oracle: Arc<dyn Oracle>,
        timeout: Duration,
        who: Entity,
        resource: Resource,
        role: Role,
        args: Vec<Word>,
    ) -> Option<bool> {
        let Some(slot) = self.acquire_worker() else {
            warn!(max_workers = self.max_workers, "oracle workers exhausted");
            return None;
        };
        let marks = scope::snapshot();
        let (tx, rx) = mpsc::sync_channel(1);
        let spawned = thread::Builder::new()
            .name("oracle-query".into())
            .spawn(move || {
                let _slot = slot;
                let _scope = scope::enter(&marks);
                let answer = Self::query_inline(oracle.as_ref(), &who, &resource, &role, &args);
                // The receiver is gone after a timeout
                let _ = tx.send(answer);
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn oracle worker");
            return None;
        }

        match rx.recv_timeout(timeout) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "oracle timed out");
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Held by a live worker thread
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for OracleRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for OracleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleRegistry")
            .field("oracles", &self.len())
            .field("timeout", &self.timeout)
            .field("max_workers", &self.max_workers)
            .field("max_queries", &self.max_queries)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl OracleGateway for OracleRegistry {
    fn can_perform(
        &self,
        oracle_ref: OracleRef,
        who: &Entity,
        resource: &Resource,
        role: &Role,
        args: &[Word],
    ) -> bool {
        let Some(oracle) = self.lookup(&oracle_ref) else {
            warn!(oracle = %oracle_ref, "oracle not registered");
            return false;
        };

        let answer = match self.timeout {
            None => Self::query_inline(oracle.as_ref(), who, resource, role, args),
            Some(timeout) => {
                self.query_bounded(oracle, timeout, *who, *resource, *role, args.to_vec())
            }
        };
        answer.unwrap_or(false)
    }
}

/// The registry as seen by one decision
pub(crate) struct DecisionOracles<'a> {
    registry: &'a OracleRegistry,
    remaining: Cell<usize>,
}

impl OracleGateway for DecisionOracles<'_> {
    fn can_perform(
        &self,
        oracle_ref: OracleRef,
        who: &Entity,
        resource: &Resource,
        role: &Role,
        args: &[Word],
    ) -> bool {
        let Some(remaining) = self.remaining.get().checked_sub(1) else {
            warn!(
                oracle = %oracle_ref,
                max_queries = self.registry.max_queries,
                "oracle query budget exhausted"
            );
            return false;
        };
        self.remaining.set(remaining);
        self.registry.can_perform(oracle_ref, who, resource, role, args)
    }
}
