//! Map gameplay events to trigger candidates

use crate::core::types::BodyPart;
use crate::director::events::{HitRecord, KillCause};
use crate::trigger::TriggerKind;

/// Candidate kinds for a kill. `BasicKill` is always present; the arbiter
/// sorts by priority, so order here does not matter.
pub fn kill_candidates(cause: &KillCause, last_hit: Option<&HitRecord>) -> Vec<TriggerKind> {
    let mut candidates = vec![TriggerKind::BasicKill];

    if cause.enemies_remaining == Some(0) {
        candidates.push(TriggerKind::LastEnemy);
    }

    if let Some(part) = cause.severed {
        candidates.push(TriggerKind::Dismemberment);
        if part.is_head_or_neck() {
            candidates.push(TriggerKind::Decapitation);
        }
    }

    if cause.headshot {
        candidates.push(TriggerKind::Headshot);
    }

    let head_hit = cause.hit_part.is_some_and(|part| part.is_head_or_neck());
    let critical_hit = last_hit.is_some_and(|hit| hit.is_critical || hit.is_sneak_attack);
    if cause.is_critical || head_hit || critical_hit {
        candidates.push(TriggerKind::Critical);
    }

    candidates
}

/// Candidates for a kill known only from a death notification
pub fn death_candidates(last_hit: &HitRecord) -> Vec<TriggerKind> {
    let cause = KillCause {
        is_critical: last_hit.is_critical || last_hit.is_sneak_attack,
        damage: last_hit.strength,
        traits: last_hit.traits,
        ..KillCause::default()
    };
    kill_candidates(&cause, Some(last_hit))
}

/// A limb severed without killing
pub fn dismember_candidates(part: BodyPart) -> Vec<TriggerKind> {
    if part.is_head_or_neck() {
        vec![TriggerKind::Decapitation]
    } else {
        vec![TriggerKind::Dismemberment]
    }
}
