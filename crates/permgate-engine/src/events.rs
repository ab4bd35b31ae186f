//! Mutation notifications for audit and indexing
//!
//! One event is published per state change, after the state lock is
//! released. Decisions never publish.

use core_identity::{Entity, ParamHash, Resource, Role};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// A successful state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PermissionEvent {
    /// A grant was written or removed
    GrantChanged {
        /// Grant holder
        entity: Entity,
        /// Resource of the permission
        resource: Resource,
        /// Role of the permission
        role: Role,
        /// `true` after a grant, `false` after a revoke
        allowed: bool,
        /// Parameter set of a conditional grant
        params: Option<ParamHash>,
    },
    /// A permission's manager was assigned or replaced
    ManagerChanged {
        /// Resource of the permission
        resource: Resource,
        /// Role of the permission
        role: Role,
        /// The new manager
        manager: Entity,
    },
}

/// Receiver of [`PermissionEvent`]s
pub trait EventSink: Send + Sync {
    /// Handle one event
    fn publish(&self, event: &PermissionEvent);
}

/// Writes events to the `tracing` log at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &PermissionEvent) {
        match event {
            PermissionEvent::GrantChanged {
                entity,
                resource,
                role,
                allowed,
                params,
            } => info!(
                %entity,
                %resource,
                %role,
                allowed,
                params = params.map(|hash| hash.to_hex()).as_deref(),
                "grant changed"
            ),
            PermissionEvent::ManagerChanged {
                resource,
                role,
                manager,
            } => info!(%resource, %role, %manager, "manager changed"),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PermissionEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<PermissionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every stored event
    pub fn drain(&self) -> Vec<PermissionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &PermissionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
