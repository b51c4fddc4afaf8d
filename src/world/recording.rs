//! In-memory host doubles used by the replay binary and tests

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::camera::CameraMode;
use crate::core::types::{ProjectileHandle, TransformHandle, NORMAL_TIME_SCALE};
use crate::world::{AimRay, EffectSink, HostFault, ProjectileStatus, RaycastHit, WorldProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkOp {
    TimeScale,
    CameraMode,
    MeshVisibility,
    WeaponFireBlocked,
}

/// One successful write
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SinkCall {
    TimeScale { factor: f32 },
    CameraMode { mode: CameraMode, target: Option<TransformHandle> },
    MeshVisibility { show: bool },
    WeaponFireBlocked { blocked: bool },
}

/// Effect sink that remembers the current world state and every write.
/// Faults can be queued per operation to exercise the failure paths.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    pub time_scale: f32,
    pub camera_mode: CameraMode,
    pub camera_target: Option<TransformHandle>,
    pub mesh_visible: bool,
    pub weapon_blocked: bool,
    calls: Vec<SinkCall>,
    faults: AHashMap<SinkOp, VecDeque<HostFault>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            time_scale: NORMAL_TIME_SCALE,
            camera_mode: CameraMode::Idle,
            camera_target: None,
            mesh_visible: false,
            weapon_blocked: false,
            calls: Vec::new(),
            faults: AHashMap::new(),
        }
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SinkCall> {
        std::mem::take(&mut self.calls)
    }

    /// Fail the next call to `op` with `fault`
    pub fn inject_fault(&mut self, op: SinkOp, fault: HostFault) {
        self.faults.entry(op).or_default().push_back(fault);
    }

    pub fn time_scale_writes(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::TimeScale { factor } => Some(*factor),
                _ => None,
            })
            .collect()
    }

    fn check(&mut self, op: SinkOp) -> Result<(), HostFault> {
        match self.faults.get_mut(&op).and_then(|queue| queue.pop_front()) {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl EffectSink for RecordingSink {
    fn set_time_scale(&mut self, factor: f32) -> Result<(), HostFault> {
        self.check(SinkOp::TimeScale)?;
        self.time_scale = factor;
        self.calls.push(SinkCall::TimeScale { factor });
        Ok(())
    }

    fn set_camera_mode(&mut self, mode: CameraMode, target: Option<TransformHandle>) -> Result<(), HostFault> {
        self.check(SinkOp::CameraMode)?;
        self.camera_mode = mode;
        self.camera_target = target;
        self.calls.push(SinkCall::CameraMode { mode, target });
        Ok(())
    }

    fn set_mesh_visibility(&mut self, show: bool) -> Result<(), HostFault> {
        self.check(SinkOp::MeshVisibility)?;
        self.mesh_visible = show;
        self.calls.push(SinkCall::MeshVisibility { show });
        Ok(())
    }

    fn set_weapon_fire_blocked(&mut self, blocked: bool) -> Result<(), HostFault> {
        self.check(SinkOp::WeaponFireBlocked)?;
        self.weapon_blocked = blocked;
        self.calls.push(SinkCall::WeaponFireBlocked { blocked });
        Ok(())
    }
}

/// World probe whose answers are set by hand
#[derive(Debug, Clone, Default)]
pub struct ScriptedWorld {
    projectiles: AHashMap<ProjectileHandle, ProjectileStatus>,
    live_transforms: AHashSet<TransformHandle>,
    raycast_hit: Option<RaycastHit>,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a projectile's status. An in-flight projectile's transform is
    /// marked alive.
    pub fn set_projectile(&mut self, projectile: ProjectileHandle, status: ProjectileStatus) {
        if let ProjectileStatus::InFlight { transform } = status {
            self.live_transforms.insert(transform);
        }
        self.projectiles.insert(projectile, status);
    }

    pub fn spawn_transform(&mut self, transform: TransformHandle) {
        self.live_transforms.insert(transform);
    }

    pub fn destroy_transform(&mut self, transform: TransformHandle) {
        self.live_transforms.remove(&transform);
    }

    pub fn set_raycast_hit(&mut self, hit: Option<RaycastHit>) {
        self.raycast_hit = hit;
    }
}

impl WorldProbe for ScriptedWorld {
    /// Unknown projectiles read as destroyed
    fn projectile_status(&self, projectile: ProjectileHandle) -> ProjectileStatus {
        self.projectiles
            .get(&projectile)
            .copied()
            .unwrap_or(ProjectileStatus::Destroyed)
    }

    fn transform_alive(&self, transform: TransformHandle) -> bool {
        self.live_transforms.contains(&transform)
    }

    fn raycast(&self, ray: &AimRay) -> Option<RaycastHit> {
        self.raycast_hit.filter(|hit| hit.distance <= ray.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;
    use glam::Vec3;

    #[test]
    fn test_sink_records_writes() {
        let mut sink = RecordingSink::new();
        sink.set_time_scale(0.3).unwrap();
        sink.set_weapon_fire_blocked(true).unwrap();

        assert_eq!(sink.time_scale, 0.3);
        assert!(sink.weapon_blocked);
        assert_eq!(sink.calls().len(), 2);
        assert_eq!(sink.time_scale_writes(), vec![0.3]);
    }

    #[test]
    fn test_injected_fault_fires_once_and_skips_write() {
        let mut sink = RecordingSink::new();
        sink.inject_fault(SinkOp::TimeScale, HostFault::Other("boom".into()));

        assert!(sink.set_time_scale(0.2).is_err());
        assert_eq!(sink.time_scale, 1.0);
        assert!(sink.calls().is_empty());

        assert!(sink.set_time_scale(0.2).is_ok());
        assert_eq!(sink.time_scale, 0.2);
    }

    #[test]
    fn test_scripted_world_answers() {
        let mut world = ScriptedWorld::new();
        let arrow = ProjectileHandle::new(1, 0);
        let body = TransformHandle::new(9, 0);

        assert_eq!(world.projectile_status(arrow), ProjectileStatus::Destroyed);

        world.set_projectile(arrow, ProjectileStatus::InFlight { transform: body });
        assert!(world.transform_alive(body));

        world.destroy_transform(body);
        assert!(!world.transform_alive(body));
    }

    #[test]
    fn test_raycast_respects_range() {
        let mut world = ScriptedWorld::new();
        world.set_raycast_hit(Some(RaycastHit { entity: Some(EntityId(2)), distance: 150.0 }));

        let short = AimRay::new(Vec3::ZERO, Vec3::Z, 100.0);
        let long = AimRay::new(Vec3::ZERO, Vec3::Z, 200.0);
        assert!(world.raycast(&short).is_none());
        assert!(world.raycast(&long).is_some());
    }
}
