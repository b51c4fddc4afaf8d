//! Gameplay events pushed in by host hook points

use serde::{Deserialize, Serialize};

use crate::core::types::{BodyPart, EntityId, ProjectileHandle, Timestamp};
use crate::trigger::EventTraits;
use crate::world::AimRay;

/// One hit landed on an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target: EntityId,
    pub source: Option<EntityId>,
    pub strength: f32,
    /// Target was alive before this hit
    pub was_alive: bool,
    pub is_critical: bool,
    pub is_sneak_attack: bool,
    /// Target health after the hit as a fraction of max health
    #[serde(default = "full_health")]
    pub health_fraction: f32,
    #[serde(default)]
    pub traits: EventTraits,
}

fn full_health() -> f32 {
    1.0
}

impl DamageEvent {
    pub fn new(target: EntityId, source: Option<EntityId>, strength: f32) -> Self {
        Self {
            target,
            source,
            strength,
            was_alive: true,
            is_critical: false,
            is_sneak_attack: false,
            health_fraction: full_health(),
            traits: EventTraits::default(),
        }
    }

    pub fn is_lethal(&self) -> bool {
        self.was_alive && self.health_fraction <= 0.0
    }
}

/// What the host knows about a confirmed kill
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KillCause {
    pub killer: Option<EntityId>,
    /// Body part the killing blow landed on
    pub hit_part: Option<BodyPart>,
    /// Part severed by the killing blow
    pub severed: Option<BodyPart>,
    /// Host's headshot-collider predicate
    pub headshot: bool,
    pub is_critical: bool,
    pub damage: f32,
    /// Hostiles still alive after this kill, when the host counts them
    pub enemies_remaining: Option<u32>,
    pub traits: EventTraits,
}

/// Last hit the player landed on an entity, kept briefly so death-only
/// notifications can still be classified
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub at: Timestamp,
    pub strength: f32,
    pub is_critical: bool,
    pub is_sneak_attack: bool,
    pub traits: EventTraits,
}

impl HitRecord {
    pub fn from_damage(event: &DamageEvent, at: Timestamp) -> Self {
        Self {
            at,
            strength: event.strength,
            is_critical: event.is_critical,
            is_sneak_attack: event.is_sneak_attack,
            traits: event.traits,
        }
    }
}

/// Projectile launch from a weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileShot {
    pub shooter: EntityId,
    pub projectile: ProjectileHandle,
    pub aim: AimRay,
}
