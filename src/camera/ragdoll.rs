//! Ragdoll transforms captured at death

use ahash::AHashMap;

use crate::core::types::{EntityId, TransformHandle};

/// Dead entity -> ragdoll root transform. The table only stores handles;
/// liveness is checked against the world on every use.
#[derive(Debug, Clone, Default)]
pub struct RagdollTargetTable {
    entries: AHashMap<EntityId, TransformHandle>,
}

impl RagdollTargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ragdoll. A newer death for the same id replaces the old
    /// entry, which is returned.
    pub fn capture(&mut self, entity: EntityId, transform: TransformHandle) -> Option<TransformHandle> {
        self.entries.insert(entity, transform)
    }

    pub fn lookup(&self, entity: EntityId) -> Option<TransformHandle> {
        self.entries.get(&entity).copied()
    }

    pub fn evict(&mut self, entity: EntityId) -> Option<TransformHandle> {
        self.entries.remove(&entity)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
