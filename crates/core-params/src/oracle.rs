//! Oracle capability consulted by oracle nodes

use crate::error::OracleError;
use crate::word::Word;
use core_identity::{Entity, Resource, Role};
use std::fmt;

/// Address-like reference to an oracle, taken from a node's low 160 bits
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OracleRef([u8; 20]);

impl OracleRef {
    /// Wrap a raw address
    #[must_use]
    pub const fn new(address: [u8; 20]) -> Self {
        Self(address)
    }

    /// Extract the reference embedded in a node value
    #[must_use]
    pub fn from_word(word: Word) -> Self {
        Self(word.low_address())
    }

    /// Raw address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<Entity> for OracleRef {
    fn from(entity: Entity) -> Self {
        Self(*entity.as_bytes())
    }
}

impl fmt::Display for OracleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OracleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OracleRef({})", self)
    }
}

/// An external read-only decision source
///
/// Implementations must not mutate permission state. An `Err` is treated
/// the same as `Ok(false)`.
pub trait Oracle: Send + Sync {
    /// Whether `who` may perform `role` on `resource` given `args`
    fn can_perform(
        &self,
        who: &Entity,
        resource: &Resource,
        role: &Role,
        args: &[Word],
    ) -> Result<bool, OracleError>;
}

/// Resolves oracle references and answers on their behalf
///
/// Every failure mode (unknown reference, oracle error, timeout, panic)
/// must come back as `false`.
pub trait OracleGateway {
    /// Ask the oracle at `oracle`
    fn can_perform(
        &self,
        oracle: OracleRef,
        who: &Entity,
        resource: &Resource,
        role: &Role,
        args: &[Word],
    ) -> bool;
}

/// Gateway with no oracles: every query is denied
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracles;

impl OracleGateway for NoOracles {
    fn can_perform(
        &self,
        _oracle: OracleRef,
        _who: &Entity,
        _resource: &Resource,
        _role: &Role,
        _args: &[Word],
    ) -> bool {
        false
    }
}
