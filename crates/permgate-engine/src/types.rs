use serde::{Deserialize, Serialize};

/// Which lookup tier produced an allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantTier {
    /// Grant held by the requesting entity itself
    Direct,
    /// Grant held by the wildcard entity
    Wildcard,
}

/// Authorization decision result
///
/// Returned by [`PermissionEngine::decide`](crate::PermissionEngine::decide)
/// to indicate whether a role may be exercised and which grant allowed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDecision {
    /// Whether the role may be exercised
    pub allowed: bool,
    /// Tier that allowed it, `None` on deny
    pub tier: Option<GrantTier>,
    /// Evaluation time in microseconds
    pub evaluation_time_us: u64,
}

impl AuthDecision {
    /// A deny with no tier
    #[must_use]
    pub fn denied(evaluation_time_us: u64) -> Self {
        Self {
            allowed: false,
            tier: None,
            evaluation_time_us,
        }
    }
}
