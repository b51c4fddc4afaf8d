//! Slow-motion effect lifecycle

pub mod session;

pub use session::{EffectParams, EffectSession, EffectState, SessionEvent};

use crate::core::types::MIN_TIME_SCALE;

/// Deepen the slowdown for heavy hits. `damage` is raw hit strength;
/// 100 or more applies the full extra 30% of the remaining headroom.
pub fn dynamic_time_scale(base: f32, damage: f32) -> f32 {
    if damage.is_nan() || damage <= 0.0 {
        return base;
    }
    let weight = (damage / 100.0).clamp(0.0, 1.0);
    (base - (1.0 - base) * weight * 0.3).max(MIN_TIME_SCALE)
}
