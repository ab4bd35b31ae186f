pub mod check;
pub mod params;

use core_identity::{Entity, IdentityError, Role};

/// Parse an entity, accepting `*` or `any` for the wildcard
pub fn parse_entity(s: &str) -> Result<Entity, IdentityError> {
    match s.trim() {
        "*" | "any" | "ANY" => Ok(Entity::ANY),
        hex => hex.parse(),
    }
}

/// Parse a role: `0x` plus 64 hex digits is a raw id, anything else a name
pub fn parse_role(s: &str) -> Result<Role, IdentityError> {
    let s = s.trim();
    match s.strip_prefix("0x") {
        Some(digits) if digits.len() == Role::LEN * 2 => s.parse(),
        _ => Ok(Role::from_name(s)),
    }
}
