//! Process-local execution environment

use core_params::ExecutionEnv;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock timestamps and a host-driven block height
///
/// The block height starts at the given value and only moves when the host
/// calls [`set_block_height`](Self::set_block_height) or
/// [`advance_block`](Self::advance_block).
#[derive(Debug, Default)]
pub struct SystemEnv {
    block_height: AtomicU64,
}

impl SystemEnv {
    /// Environment starting at `block_height`
    #[must_use]
    pub fn new(block_height: u64) -> Self {
        Self {
            block_height: AtomicU64::new(block_height),
        }
    }

    /// Replace the block height
    pub fn set_block_height(&self, height: u64) {
        self.block_height.store(height, Ordering::SeqCst);
    }

    /// Increment the block height, returning the new value
    pub fn advance_block(&self) -> u64 {
        self.block_height.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }
}

impl ExecutionEnv for SystemEnv {
    fn block_height(&self) -> u64 {
        self.block_height.load(Ordering::SeqCst)
    }

    fn timestamp(&self) -> u64 {
        // A clock before 1970 reads as 0
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0)
    }
}
