//! Tracks bodies the player has thrown so impact deaths get credited

use ahash::AHashMap;

use crate::core::types::{EntityId, Timestamp};

/// Throw records older than this are dropped
pub const MAX_THROW_AGE: Timestamp = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ThrowState {
    released_at: Timestamp,
    impact_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default)]
pub struct ThrowTracker {
    throws: AHashMap<EntityId, ThrowState>,
}

impl ThrowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player let go of `entity`. Re-throwing resets any earlier impact.
    pub fn record_release(&mut self, entity: EntityId, now: Timestamp) {
        self.throws.insert(
            entity,
            ThrowState {
                released_at: now,
                impact_at: None,
            },
        );
    }

    /// Thrown body hit something. Ignored for bodies never thrown.
    pub fn record_impact(&mut self, entity: EntityId, now: Timestamp) -> bool {
        match self.throws.get_mut(&entity) {
            Some(state) => {
                state.impact_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Consume the throw record if `entity` hit something within `window`
    /// seconds of `now`
    pub fn take_recent_impact(&mut self, entity: EntityId, now: Timestamp, window: Timestamp) -> bool {
        let recent = self
            .throws
            .get(&entity)
            .and_then(|state| state.impact_at)
            .is_some_and(|impact_at| now - impact_at <= window);

        if recent {
            self.throws.remove(&entity);
        }
        recent
    }

    pub fn forget(&mut self, entity: EntityId) {
        self.throws.remove(&entity);
    }

    /// Drop stale records, returning how many were removed
    pub fn cleanup(&mut self, now: Timestamp) -> usize {
        let before = self.throws.len();
        self.throws.retain(|_, state| now - state.released_at <= MAX_THROW_AGE);
        before - self.throws.len()
    }

    pub fn clear(&mut self) {
        self.throws.clear();
    }

    pub fn len(&self) -> usize {
        self.throws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.throws.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_without_release_ignored() {
        let mut tracker = ThrowTracker::new();
        assert!(!tracker.record_impact(EntityId(1), 0.0));
        assert!(!tracker.take_recent_impact(EntityId(1), 0.0, 1.0));
    }

    #[test]
    fn test_recent_impact_consumed_once() {
        let mut tracker = ThrowTracker::new();
        tracker.record_release(EntityId(1), 0.0);
        tracker.record_impact(EntityId(1), 0.8);

        assert!(tracker.take_recent_impact(EntityId(1), 1.0, 1.5));
        assert!(!tracker.take_recent_impact(EntityId(1), 1.0, 1.5));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_old_impact_not_credited() {
        let mut tracker = ThrowTracker::new();
        tracker.record_release(EntityId(1), 0.0);
        tracker.record_impact(EntityId(1), 0.5);

        assert!(!tracker.take_recent_impact(EntityId(1), 3.0, 1.5));
    }

    #[test]
    fn test_release_without_impact_not_credited() {
        let mut tracker = ThrowTracker::new();
        tracker.record_release(EntityId(1), 0.0);
        assert!(!tracker.take_recent_impact(EntityId(1), 0.1, 1.5));
    }

    #[test]
    fn test_cleanup_drops_stale_throws() {
        let mut tracker = ThrowTracker::new();
        tracker.record_release(EntityId(1), 0.0);
        tracker.record_release(EntityId(2), 8.0);

        assert_eq!(tracker.cleanup(12.0), 1);
        assert_eq!(tracker.len(), 1);
    }
}
