//! Key-value state behind every decision
//!
//! Pure lookup and write. Authorization of writes is enforced by
//! [`PermissionManager`](crate::PermissionManager).

use core_identity::{Entity, Resource, Role};
use core_params::GrantRef;
use std::collections::BTreeMap;

/// Grants keyed by (entity, resource, role) and managers keyed by (resource, role)
#[derive(Debug, Clone, Default)]
pub struct PermissionStore {
    grants: BTreeMap<(Entity, Resource, Role), GrantRef>,
    managers: BTreeMap<(Resource, Role), Entity>,
}

impl PermissionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager of a permission, `None` until created
    #[must_use]
    pub fn manager(&self, resource: &Resource, role: &Role) -> Option<Entity> {
        self.managers.get(&(*resource, *role)).copied()
    }

    /// Record the manager of a permission
    pub fn set_manager(&mut self, resource: Resource, role: Role, manager: Entity) {
        self.managers.insert((resource, role), manager);
    }

    /// Grant held by `entity`, `None` when absent
    #[must_use]
    pub fn grant(&self, entity: &Entity, resource: &Resource, role: &Role) -> Option<GrantRef> {
        self.grants.get(&(*entity, *resource, *role)).copied()
    }

    /// Write or remove (`None`) a grant
    pub fn set_grant(
        &mut self,
        entity: Entity,
        resource: Resource,
        role: Role,
        grant: Option<GrantRef>,
    ) {
        let key = (entity, resource, role);
        match grant {
            Some(grant) => {
                self.grants.insert(key, grant);
            }
            None => {
                self.grants.remove(&key);
            }
        }
    }

    /// Number of live grants
    #[must_use]
    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    /// Number of created permissions
    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.managers.len()
    }
}
