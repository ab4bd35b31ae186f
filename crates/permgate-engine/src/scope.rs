//! Per-thread record of the engines a thread is deciding for
//!
//! A decision marks its thread for the duration of the evaluation, and an
//! oracle worker inherits the mark of the decision that spawned it. The
//! engine refuses state access from a marked thread, so an oracle can never
//! read or mutate the permissions it is being asked about.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static ACTIVE: RefCell<Vec<u64>> = RefCell::new(Vec::new());
}

/// Fresh engine identity
pub(crate) fn next_engine_id() -> u64 {
    NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Whether this thread is evaluating a decision of engine `id`
pub(crate) fn is_active(id: u64) -> bool {
    ACTIVE.with(|active| active.borrow().contains(&id))
}

/// Marks held by this thread, for handing to a worker
pub(crate) fn snapshot() -> Vec<u64> {
    ACTIVE.with(|active| active.borrow().clone())
}

/// Mark this thread until the guard drops
pub(crate) fn enter(ids: &[u64]) -> ScopeGuard {
    let restore_len = ACTIVE.with(|active| {
        let mut active = active.borrow_mut();
        let len = active.len();
        active.extend_from_slice(ids);
        len
    });
    ScopeGuard { restore_len }
}

/// Removes the marks added by [`enter`]
#[must_use]
pub(crate) struct ScopeGuard {
    restore_len: usize,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.borrow_mut().truncate(self.restore_len));
    }
}
