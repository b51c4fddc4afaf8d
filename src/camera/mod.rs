//! Ride-cam: projectile and ragdoll follow camera
//!
//! Runs beside the effect session. While it is anywhere but Idle the
//! player's weapon must not fire.

pub mod controller;
pub mod ragdoll;

use serde::{Deserialize, Serialize};

pub use controller::{CameraController, CameraTransition, ReturnReason};
pub use ragdoll::RagdollTargetTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    Idle,
    PredictiveArmed,
    TrackingProjectile,
    TrackingRagdoll,
    Returning,
}

impl CameraMode {
    /// Third-person modes that show the player's own body
    pub fn is_third_person(&self) -> bool {
        matches!(
            self,
            CameraMode::TrackingProjectile | CameraMode::TrackingRagdoll | CameraMode::Returning
        )
    }
}
