//! Execution environment consulted by block-height and timestamp nodes

/// Source of the ambient values a decision may depend on
pub trait ExecutionEnv: Send + Sync {
    /// Current block height
    fn block_height(&self) -> u64;

    /// Current time in Unix seconds
    fn timestamp(&self) -> u64;
}

/// Environment frozen at fixed values
///
/// ```
/// use core_params::{ExecutionEnv, FixedEnv};
///
/// let env = FixedEnv { block_height: 10, timestamp: 1_700_000_000 };
/// assert_eq!(env.block_height(), 10);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedEnv {
    /// Reported block height
    pub block_height: u64,
    /// Reported timestamp
    pub timestamp: u64,
}

impl ExecutionEnv for FixedEnv {
    fn block_height(&self) -> u64 {
        self.block_height
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}
