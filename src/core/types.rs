//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unscaled wall-clock time in seconds since the director was created
pub type Timestamp = f64;

/// Neutral world time scale
pub const NORMAL_TIME_SCALE: f32 = 1.0;

/// Slowest time scale the engine will ever request
pub const MIN_TIME_SCALE: f32 = 0.05;

/// Host-assigned identifier for a living (or recently living) entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Slot index plus generation for an engine object the core does not own.
///
/// The host bumps the generation whenever a slot is reused, so a stale id
/// never aliases a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId {
    pub index: u32,
    pub generation: u32,
}

impl HandleId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Back-reference to an in-flight projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileHandle(pub HandleId);

impl ProjectileHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self(HandleId::new(index, generation))
    }
}

/// Back-reference to a scene transform (ragdoll root, projectile body)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformHandle(pub HandleId);

impl TransformHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self(HandleId::new(index, generation))
    }
}

/// Damage categories the host reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Unknown,
    Slash,
    Pierce,
    Blunt,
    Energy,
    Fire,
    Lightning,
}

impl DamageType {
    pub const ALL: [DamageType; 7] = [
        DamageType::Unknown,
        DamageType::Slash,
        DamageType::Pierce,
        DamageType::Blunt,
        DamageType::Energy,
        DamageType::Fire,
        DamageType::Lightning,
    ];
}

/// Body part categories relevant to dismemberment triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Head,
    Neck,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl BodyPart {
    /// Severing this part counts as a decapitation
    pub fn is_head_or_neck(&self) -> bool {
        matches!(self, BodyPart::Head | BodyPart::Neck)
    }
}
