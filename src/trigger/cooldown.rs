//! Cooldown registry
//!
//! Pure time bookkeeping. Reads never mutate; `reserve` is the only writer and
//! is called after the caller has committed to firing.

use ahash::AHashMap;

use crate::core::types::Timestamp;
use crate::trigger::TriggerKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooldownRegistry {
    global_ready_at: Timestamp,
    per_trigger: AHashMap<TriggerKind, Timestamp>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global_ready(&self, now: Timestamp) -> bool {
        now >= self.global_ready_at
    }

    /// Absent entries count as ready
    pub fn kind_ready(&self, kind: TriggerKind, now: Timestamp) -> bool {
        self.per_trigger
            .get(&kind)
            .map_or(true, |ready_at| now >= *ready_at)
    }

    pub fn is_ready(&self, kind: TriggerKind, now: Timestamp) -> bool {
        self.global_ready(now) && self.kind_ready(kind, now)
    }

    /// Read-only pre-check used during arbitration
    pub fn try_reserve(&self, kind: TriggerKind, now: Timestamp) -> bool {
        self.is_ready(kind, now)
    }

    /// Start both cooldown windows at `now`
    pub fn reserve(
        &mut self,
        kind: TriggerKind,
        now: Timestamp,
        global_cooldown: Timestamp,
        per_kind_cooldown: Timestamp,
    ) {
        self.global_ready_at = now + global_cooldown.max(0.0);
        self.per_trigger.insert(kind, now + per_kind_cooldown.max(0.0));
    }

    pub fn global_ready_at(&self) -> Timestamp {
        self.global_ready_at
    }

    pub fn ready_at(&self, kind: TriggerKind) -> Option<Timestamp> {
        self.per_trigger.get(&kind).copied()
    }

    /// Drop entries that expired more than `retention` seconds ago.
    /// Returns the number of entries removed.
    pub fn expire(&mut self, now: Timestamp, retention: Timestamp) -> usize {
        let before = self.per_trigger.len();
        self.per_trigger.retain(|_, ready_at| now - *ready_at <= retention);
        before - self.per_trigger.len()
    }

    pub fn len(&self) -> usize {
        self.per_trigger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_trigger.is_empty()
    }

    pub fn clear(&mut self) {
        self.global_ready_at = 0.0;
        self.per_trigger.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_registry_is_ready() {
        let registry = CooldownRegistry::new();
        for kind in TriggerKind::ALL {
            assert!(registry.is_ready(kind, 0.0));
        }
    }

    #[test]
    fn test_reserve_blocks_until_window_ends() {
        let mut registry = CooldownRegistry::new();
        registry.reserve(TriggerKind::Critical, 10.0, 2.0, 5.0);

        assert!(!registry.global_ready(11.9));
        assert!(registry.global_ready(12.0));

        assert!(!registry.kind_ready(TriggerKind::Critical, 14.9));
        assert!(registry.kind_ready(TriggerKind::Critical, 15.0));

        // Other kinds only wait on the global window
        assert!(!registry.is_ready(TriggerKind::BasicKill, 11.0));
        assert!(registry.is_ready(TriggerKind::BasicKill, 12.0));
    }

    #[test]
    fn test_try_reserve_is_read_only() {
        let mut registry = CooldownRegistry::new();
        registry.reserve(TriggerKind::Parry, 0.0, 1.0, 1.0);
        let snapshot = registry.clone();

        assert!(!registry.try_reserve(TriggerKind::Parry, 0.5));
        assert!(registry.try_reserve(TriggerKind::Parry, 1.0));
        assert_eq!(registry, snapshot);
    }

    #[test]
    fn test_re_reserve_restarts_window() {
        let mut registry = CooldownRegistry::new();
        registry.reserve(TriggerKind::BasicKill, 0.0, 0.0, 3.0);
        // Effect ended at t=2, window restarts from there
        registry.reserve(TriggerKind::BasicKill, 2.0, 0.0, 3.0);

        assert!(!registry.kind_ready(TriggerKind::BasicKill, 4.0));
        assert!(registry.kind_ready(TriggerKind::BasicKill, 5.0));
    }

    #[test]
    fn test_expire_drops_old_entries() {
        let mut registry = CooldownRegistry::new();
        registry.reserve(TriggerKind::BasicKill, 0.0, 0.0, 1.0);
        registry.reserve(TriggerKind::Critical, 50.0, 0.0, 1.0);

        let removed = registry.expire(60.0, 30.0);
        assert_eq!(removed, 1);
        assert_eq!(registry.ready_at(TriggerKind::BasicKill), None);
        assert_eq!(registry.ready_at(TriggerKind::Critical), Some(51.0));
    }
}
