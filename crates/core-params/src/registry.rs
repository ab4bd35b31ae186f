//! Content-addressed storage of parameter sets

use crate::param::Param;
use crate::word::Word;
use core_identity::ParamHash;
use std::collections::BTreeMap;
use std::fmt;

/// What a grant points at
///
/// Absence of a grant is `Option::None` at the store level, so it can never
/// be confused with [`GrantRef::Unconditional`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantRef {
    /// Allowed without evaluating anything
    Unconditional,
    /// Allowed when the stored parameter set evaluates to true
    Params(ParamHash),
}

impl GrantRef {
    /// The parameter set hash, if any
    #[must_use]
    pub fn params(&self) -> Option<ParamHash> {
        match self {
            Self::Unconditional => None,
            Self::Params(hash) => Some(*hash),
        }
    }
}

impl fmt::Display for GrantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconditional => write!(f, "unconditional"),
            Self::Params(hash) => write!(f, "params {}", hash),
        }
    }
}

/// Content address of a raw parameter encoding
///
/// The digest covers the big-endian bytes of every word in order.
#[must_use]
pub fn hash_words(raw: &[Word]) -> ParamHash {
    let parts: Vec<&[u8]> = raw.iter().map(|word| word.as_bytes().as_slice()).collect();
    ParamHash::of_parts(&parts)
}

/// Write-once store of decoded parameter sets keyed by their content hash
///
/// ## Example
///
/// ```
/// use core_params::{Op, Param, ParamSetRegistry};
///
/// let raw = vec![Param::arg(0, Op::Eq, 5u64).encode()];
/// let mut registry = ParamSetRegistry::new();
///
/// let first = registry.save(&raw);
/// let second = registry.save(&raw);
///
/// assert_eq!(first, second);
/// assert_eq!(registry.set_count(), 1);
/// assert_eq!(registry.get(&first, 0), Some(Param::arg(0, Op::Eq, 5u64)));
/// assert_eq!(registry.get(&first, 1), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamSetRegistry {
    sets: BTreeMap<ParamHash, Vec<Param>>,
}

impl ParamSetRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `raw` (decoded) under its content hash and return the hash
    ///
    /// Saving input that is already stored leaves the existing entry intact.
    pub fn save(&mut self, raw: &[Word]) -> ParamHash {
        let hash = hash_words(raw);
        self.sets
            .entry(hash)
            .or_insert_with(|| raw.iter().copied().map(Param::decode).collect());
        hash
    }

    /// Node `index` of the set stored under `hash`
    ///
    /// `None` for an unknown hash or an out-of-range index.
    #[must_use]
    pub fn get(&self, hash: &ParamHash, index: u32) -> Option<Param> {
        let index = usize::try_from(index).ok()?;
        self.sets.get(hash)?.get(index).copied()
    }

    /// Number of nodes in the set stored under `hash`
    #[must_use]
    pub fn len(&self, hash: &ParamHash) -> Option<usize> {
        self.sets.get(hash).map(Vec::len)
    }

    /// Whether a set is stored under `hash`
    #[must_use]
    pub fn contains(&self, hash: &ParamHash) -> bool {
        self.sets.contains_key(hash)
    }

    /// Number of distinct stored sets
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}
