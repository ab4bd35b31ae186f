//! 256-bit operand words
//!
//! A [`Word`] is stored big-endian, so the derived byte-wise ordering is the
//! numeric ordering and no big-integer arithmetic is needed for comparisons.

use crate::error::{ParamError, Result};
use core_identity::Entity;
use std::fmt;
use std::str::FromStr;

/// Number of bits kept in a parameter node's value field
pub const VALUE_BITS: u32 = 240;

const VALUE_BYTES: usize = (VALUE_BITS / 8) as usize;
const HEADER_BYTES: usize = 32 - VALUE_BYTES;

/// Unsigned 256-bit value, big-endian
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Word([u8; 32]);

impl Word {
    /// Zero
    pub const ZERO: Word = Word([0; 32]);

    /// One
    pub const ONE: Word = {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        Word(bytes)
    };

    /// Largest representable value
    pub const MAX: Word = Word([0xff; 32]);

    /// Wrap big-endian bytes
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Big-endian bytes
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Borrow the big-endian bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the value is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Keep only the low [`VALUE_BITS`] bits
    ///
    /// Operands are narrowed to the width of a node's value field before any
    /// comparison, so values differing only above bit 239 compare equal.
    #[must_use]
    pub fn truncate_to_value(self) -> Self {
        let mut bytes = self.0;
        bytes[..HEADER_BYTES].fill(0);
        Self(bytes)
    }

    /// Whether the value fits in a node's value field without truncation
    #[must_use]
    pub fn fits_value(&self) -> bool {
        self.0[..HEADER_BYTES].iter().all(|b| *b == 0)
    }

    /// Read the 32-bit slot `slot` counted from the least significant end
    ///
    /// Slot 0 is bits 31..0, slot 1 bits 63..32, slot 2 bits 95..64.
    #[must_use]
    pub fn u32_slot(&self, slot: usize) -> u32 {
        let end = 32 - slot * 4;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.0[end - 4..end]);
        u32::from_be_bytes(buf)
    }

    /// Pack up to three 32-bit slots into a word (slot 0 least significant)
    #[must_use]
    pub fn from_u32_slots(slots: [u32; 3]) -> Self {
        let mut bytes = [0u8; 32];
        for (slot, value) in slots.iter().enumerate() {
            let end = 32 - slot * 4;
            bytes[end - 4..end].copy_from_slice(&value.to_be_bytes());
        }
        Self(bytes)
    }

    /// The low 160 bits as an address-like value
    #[must_use]
    pub fn low_address(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[12..]);
        out
    }

    /// Place an address-like value in the low 160 bits
    #[must_use]
    pub fn from_address(address: [u8; 20]) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(&address);
        Self(bytes)
    }

    /// `0x`-prefixed hex without leading zeros
    #[must_use]
    pub fn to_hex(&self) -> String {
        let full = hex::encode(self.0);
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{}", trimmed)
        }
    }
}

impl From<u64> for Word {
    fn from(n: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }
}

impl From<u128> for Word {
    fn from(n: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }
}

impl From<bool> for Word {
    fn from(b: bool) -> Self {
        if b {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

impl From<Entity> for Word {
    fn from(entity: Entity) -> Self {
        Self::from_address(*entity.as_bytes())
    }
}

impl FromStr for Word {
    type Err = ParamError;

    /// Parse decimal (up to `u128::MAX`) or `0x`-prefixed hex (up to 64 digits)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if digits.is_empty() || digits.len() > 64 {
                return Err(ParamError::InvalidWord(format!(
                    "hex literal must have 1 to 64 digits: {s}"
                )));
            }
            let padded = if digits.len() % 2 == 1 {
                format!("0{digits}")
            } else {
                digits.to_string()
            };
            let decoded =
                hex::decode(&padded).map_err(|e| ParamError::InvalidWord(format!("{s}: {e}")))?;
            let mut bytes = [0u8; 32];
            bytes[32 - decoded.len()..].copy_from_slice(&decoded);
            Ok(Self(bytes))
        } else {
            s.parse::<u128>()
                .map(Self::from)
                .map_err(|e| ParamError::InvalidWord(format!("{s}: {e}")))
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// All 64 digits; `{:#x}` adds the `0x` prefix
impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self.to_hex())
    }
}
