//! Host world boundary
//!
//! Everything the engine needs from the game lives behind two traits:
//! `EffectSink` receives the shared-state writes and `WorldProbe` answers
//! liveness and raycast queries. Handles are index+generation pairs, so a
//! stale handle is a `false`/`Destroyed` answer, never a dangling deref.

pub mod boundary;
pub mod recording;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraMode;
use crate::core::types::{EntityId, ProjectileHandle, TransformHandle};

pub use boundary::{guard, guard_with};
pub use recording::{RecordingSink, ScriptedWorld, SinkCall, SinkOp};

/// Faults surfaced by host collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum HostFault {
    /// Known engine defect: an object torn down mid-call (animation exit,
    /// camera rig swap). Safe to skip for one frame.
    #[error("transient null reference in {0}")]
    TransientNullReference(String),

    #[error("host collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("host fault: {0}")]
    Other(String),
}

impl HostFault {
    pub fn is_transient(&self) -> bool {
        matches!(self, HostFault::TransientNullReference(_))
    }
}

/// Shared world state the engine drives. Only the frame pump's
/// reconciliation step calls these.
pub trait EffectSink {
    fn set_time_scale(&mut self, factor: f32) -> Result<(), HostFault>;
    fn set_camera_mode(&mut self, mode: CameraMode, target: Option<TransformHandle>) -> Result<(), HostFault>;
    fn set_mesh_visibility(&mut self, show: bool) -> Result<(), HostFault>;
    fn set_weapon_fire_blocked(&mut self, blocked: bool) -> Result<(), HostFault>;
}

/// Where a tracked projectile is this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectileStatus {
    InFlight { transform: TransformHandle },
    Collided { struck: Option<EntityId> },
    Destroyed,
}

/// Forward aim ray from the shooter's eye
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
}

impl AimRay {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    pub entity: Option<EntityId>,
    pub distance: f32,
}

/// Read-only queries against the host world
pub trait WorldProbe {
    fn projectile_status(&self, projectile: ProjectileHandle) -> ProjectileStatus;
    fn transform_alive(&self, transform: TransformHandle) -> bool;
    fn raycast(&self, ray: &AimRay) -> Option<RaycastHit>;
}
