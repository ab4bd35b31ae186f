//! Management API: guarded writes to permission state
//!
//! Every operation takes the engine's write guard, checks its preconditions,
//! then writes. A rejected operation changes nothing. Events are published
//! after the guard is released.

use crate::engine::{EngineState, PermissionEngine};
use crate::error::{PermissionError, Result};
use crate::events::PermissionEvent;
use core_identity::{Entity, Resource, Role};
use core_params::{GrantRef, Param, Word, MAX_PARAMS_PER_SET};
use tracing::info;

/// Handle for creating, granting, revoking and re-delegating permissions
#[derive(Debug, Clone, Copy)]
pub struct PermissionManager<'a> {
    engine: &'a PermissionEngine,
}

impl<'a> PermissionManager<'a> {
    pub(crate) fn new(engine: &'a PermissionEngine) -> Self {
        Self { engine }
    }

    /// Create a permission: `entity` is granted unconditionally and `manager`
    /// becomes its manager
    ///
    /// # Errors
    ///
    /// * `PermissionError::PermissionAlreadyExists` - the permission has a manager
    /// * `PermissionError::StorePoisoned`
    /// * `PermissionError::ReentrantAccess` - called from inside a decision
    pub fn create(
        &self,
        entity: Entity,
        resource: Resource,
        role: Role,
        manager: Entity,
    ) -> Result<()> {
        {
            let mut state = self.engine.write_state()?;
            if state.store.manager(&resource, &role).is_some() {
                return Err(PermissionError::PermissionAlreadyExists {
                    entity,
                    resource,
                    role,
                });
            }
            state
                .store
                .set_grant(entity, resource, role, Some(GrantRef::Unconditional));
            state.store.set_manager(resource, role, manager);
        }

        info!(%entity, %resource, %role, %manager, "permission created");
        self.engine.publish(&[
            PermissionEvent::GrantChanged {
                entity,
                resource,
                role,
                allowed: true,
                params: None,
            },
            PermissionEvent::ManagerChanged {
                resource,
                role,
                manager,
            },
        ]);
        Ok(())
    }

    /// Grant `role` on `resource` to `entity`, conditional on `raw_params`
    /// unless it is empty
    ///
    /// # Errors
    ///
    /// * `PermissionError::Unauthorized` - `caller` is not the manager
    /// * `PermissionError::PermissionAlreadyExists` - `entity` already holds a grant
    /// * `PermissionError::TooManyParams` - more than `MAX_PARAMS_PER_SET` words
    /// * `PermissionError::StorePoisoned`
    /// * `PermissionError::ReentrantAccess` - called from inside a decision
    pub fn grant(
        &self,
        caller: Entity,
        entity: Entity,
        resource: Resource,
        role: Role,
        raw_params: &[Word],
    ) -> Result<GrantRef> {
        let grant = {
            let mut state = self.engine.write_state()?;
            authorize(&state, caller, resource, role)?;
            if state.store.grant(&entity, &resource, &role).is_some() {
                return Err(PermissionError::PermissionAlreadyExists {
                    entity,
                    resource,
                    role,
                });
            }
            if raw_params.len() > MAX_PARAMS_PER_SET {
                return Err(PermissionError::TooManyParams {
                    max: MAX_PARAMS_PER_SET,
                    attempted: raw_params.len(),
                });
            }

            let grant = if raw_params.is_empty() {
                GrantRef::Unconditional
            } else {
                GrantRef::Params(state.registry.save(raw_params))
            };
            state.store.set_grant(entity, resource, role, Some(grant));
            grant
        };

        info!(%caller, %entity, %resource, %role, %grant, "permission granted");
        self.engine.publish(&[PermissionEvent::GrantChanged {
            entity,
            resource,
            role,
            allowed: true,
            params: grant.params(),
        }]);
        Ok(grant)
    }

    /// Remove `entity`'s grant; the stored parameter set is kept
    ///
    /// # Errors
    ///
    /// * `PermissionError::Unauthorized` - `caller` is not the manager
    /// * `PermissionError::PermissionNotFound` - no grant to remove
    /// * `PermissionError::StorePoisoned`
    /// * `PermissionError::ReentrantAccess` - called from inside a decision
    pub fn revoke(
        &self,
        caller: Entity,
        entity: Entity,
        resource: Resource,
        role: Role,
    ) -> Result<()> {
        {
            let mut state = self.engine.write_state()?;
            authorize(&state, caller, resource, role)?;
            if state.store.grant(&entity, &resource, &role).is_none() {
                return Err(PermissionError::PermissionNotFound {
                    entity,
                    resource,
                    role,
                });
            }
            state.store.set_grant(entity, resource, role, None);
        }

        info!(%caller, %entity, %resource, %role, "permission revoked");
        self.engine.publish(&[PermissionEvent::GrantChanged {
            entity,
            resource,
            role,
            allowed: false,
            params: None,
        }]);
        Ok(())
    }

    /// Hand the permission to `new_manager`
    ///
    /// # Errors
    ///
    /// * `PermissionError::Unauthorized` - `caller` is not the manager
    /// * `PermissionError::StorePoisoned`
    /// * `PermissionError::ReentrantAccess` - called from inside a decision
    pub fn set_manager(
        &self,
        caller: Entity,
        resource: Resource,
        role: Role,
        new_manager: Entity,
    ) -> Result<()> {
        {
            let mut state = self.engine.write_state()?;
            authorize(&state, caller, resource, role)?;
            state.store.set_manager(resource, role, new_manager);
        }

        info!(%caller, %resource, %role, manager = %new_manager, "manager changed");
        self.engine.publish(&[PermissionEvent::ManagerChanged {
            resource,
            role,
            manager: new_manager,
        }]);
        Ok(())
    }

    /// Freeze the permission: the manager becomes [`Entity::BURN`], which
    /// can never act
    ///
    /// # Errors
    ///
    /// Same as [`set_manager`](Self::set_manager).
    pub fn burn_manager(&self, caller: Entity, resource: Resource, role: Role) -> Result<()> {
        self.set_manager(caller, resource, role, Entity::BURN)
    }

    /// Current manager
    ///
    /// # Errors
    ///
    /// `PermissionError::StorePoisoned`, or `PermissionError::ReentrantAccess`
    /// from inside a decision
    pub fn manager_of(&self, resource: Resource, role: Role) -> Result<Option<Entity>> {
        Ok(self.engine.read_state()?.store.manager(&resource, &role))
    }

    /// Grant held by `entity`
    ///
    /// # Errors
    ///
    /// `PermissionError::StorePoisoned`, or `PermissionError::ReentrantAccess`
    /// from inside a decision
    pub fn grant_of(
        &self,
        entity: Entity,
        resource: Resource,
        role: Role,
    ) -> Result<Option<GrantRef>> {
        Ok(self.engine.read_state()?.store.grant(&entity, &resource, &role))
    }

    /// Node count of `entity`'s parameter set (`Some(0)` when unconditional)
    ///
    /// # Errors
    ///
    /// `PermissionError::StorePoisoned`, or `PermissionError::ReentrantAccess`
    /// from inside a decision
    pub fn params_len(
        &self,
        entity: Entity,
        resource: Resource,
        role: Role,
    ) -> Result<Option<usize>> {
        let state = self.engine.read_state()?;
        Ok(match state.store.grant(&entity, &resource, &role) {
            None => None,
            Some(GrantRef::Unconditional) => Some(0),
            Some(GrantRef::Params(hash)) => state.registry.len(&hash),
        })
    }

    /// Node `index` of `entity`'s parameter set
    ///
    /// # Errors
    ///
    /// `PermissionError::StorePoisoned`, or `PermissionError::ReentrantAccess`
    /// from inside a decision
    pub fn param_at(
        &self,
        entity: Entity,
        resource: Resource,
        role: Role,
        index: u32,
    ) -> Result<Option<Param>> {
        let state = self.engine.read_state()?;
        Ok(state
            .store
            .grant(&entity, &resource, &role)
            .and_then(|grant| grant.params())
            .and_then(|hash| state.registry.get(&hash, index)))
    }
}

/// `caller` must be the current manager and not a sentinel
fn authorize(state: &EngineState, caller: Entity, resource: Resource, role: Role) -> Result<()> {
    match state.store.manager(&resource, &role) {
        Some(manager) if manager == caller && !caller.is_sentinel() => Ok(()),
        _ => Err(PermissionError::Unauthorized {
            caller,
            resource,
            role,
        }),
    }
}
