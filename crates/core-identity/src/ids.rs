//! Fixed-width identifiers for entities, resources, roles and parameter sets

use crate::error::{IdentityError, Result};
use crate::digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a fixed-width byte identifier rendered as `0x`-prefixed hex.
macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $len:expr, $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; $len]);

        impl $name {
            /// Width of the identifier in bytes
            pub const LEN: usize = $len;

            /// Wrap raw bytes
            #[must_use]
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Build an identifier whose low 8 bytes hold `n` (big-endian)
            #[must_use]
            pub fn from_low_u64(n: u64) -> Self {
                let mut bytes = [0u8; $len];
                bytes[$len - 8..].copy_from_slice(&n.to_be_bytes());
                Self(bytes)
            }

            /// Raw bytes of the identifier
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// `0x`-prefixed lowercase hex rendering
            #[must_use]
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = IdentityError;

            fn from_str(s: &str) -> Result<Self> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(digits).map_err(|e| IdentityError::InvalidHex {
                    kind: $kind,
                    reason: e.to_string(),
                })?;
                let actual = bytes.len();
                let bytes: [u8; $len] =
                    bytes
                        .try_into()
                        .map_err(|_| IdentityError::InvalidLength {
                            kind: $kind,
                            expected: $len,
                            actual,
                        })?;
                Ok(Self(bytes))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentityError;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_hex()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

fixed_id!(
    /// An actor that requests or holds permissions (address-like, 20 bytes)
    Entity,
    20,
    "entity"
);

fixed_id!(
    /// The protected target a role applies to (address-like, 20 bytes)
    Resource,
    20,
    "resource"
);

fixed_id!(
    /// A named action category on a resource (32 bytes)
    Role,
    32,
    "role"
);

fixed_id!(
    /// Content address of a stored parameter set (blake3 digest)
    ParamHash,
    32,
    "param hash"
);

impl Entity {
    /// Wildcard entity: a grant held by it applies to every caller
    pub const ANY: Entity = Entity([0xff; 20]);

    /// Manager assigned to a permission that can no longer be changed
    pub const BURN: Entity = Entity([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
    ]);

    /// Whether this is the wildcard entity
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        *self == Self::ANY
    }

    /// Whether this is one of the reserved sentinels (never a real caller)
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::ANY || *self == Self::BURN
    }
}

impl Role {
    /// Derive a role identifier from its human-readable name
    ///
    /// ```
    /// use core_identity::Role;
    ///
    /// assert_eq!(Role::from_name("TRANSFER_ROLE"), Role::from_name("TRANSFER_ROLE"));
    /// assert_ne!(Role::from_name("TRANSFER_ROLE"), Role::from_name("MINT_ROLE"));
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(digest::digest(name.as_bytes()))
    }
}

impl ParamHash {
    /// Content address of a byte sequence split into parts
    #[must_use]
    pub fn of_parts(parts: &[&[u8]]) -> Self {
        Self(digest::digest_chunks(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(Entity::ANY, Entity::BURN);
        assert!(Entity::ANY.is_wildcard());
        assert!(!Entity::BURN.is_wildcard());
        assert!(Entity::BURN.is_sentinel());
        assert!(!Entity::from_low_u64(7).is_sentinel());
    }

    #[test]
    fn test_from_low_u64_is_big_endian() {
        let entity = Entity::from_low_u64(0x0102);
        assert_eq!(entity.as_bytes()[18], 0x01);
        assert_eq!(entity.as_bytes()[19], 0x02);
        assert_eq!(entity.as_bytes()[..18], [0u8; 18]);
    }

    #[test]
    fn test_hex_round_trip() {
        let resource = Resource::from_low_u64(0xabcdef);
        let parsed: Resource = resource.to_hex().parse().unwrap();
        assert_eq!(parsed, resource);
    }

    #[test]
    fn test_prefix_is_optional() {
        let with: Entity = "0xffffffffffffffffffffffffffffffffffffffff".parse().unwrap();
        let without: Entity = "ffffffffffffffffffffffffffffffffffffffff".parse().unwrap();
        assert_eq!(with, Entity::ANY);
        assert_eq!(without, Entity::ANY);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = "0x0102".parse::<Entity>().unwrap_err();
        assert_eq!(
            err,
            IdentityError::InvalidLength {
                kind: "entity",
                expected: 20,
                actual: 2
            }
        );
    }

    #[test]
    fn test_bad_hex_rejected() {
        assert!(matches!(
            "0xzz".parse::<Role>(),
            Err(IdentityError::InvalidHex { kind: "role", .. })
        ));
    }
}
