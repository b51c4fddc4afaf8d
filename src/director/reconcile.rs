//! Shared world-state reconciliation
//!
//! The only code that writes time scale, camera mode, mesh visibility and
//! the weapon block flag. Neutral values (normal speed, first-person
//! camera, hidden mesh, weapon free) are written every frame so anything
//! else that touched them is put right. Other values are written on change
//! against a cache of what the host last accepted; an absorbed transient
//! fault leaves the cache untouched so the write is retried next frame.

use serde::Serialize;

use crate::camera::CameraMode;
use crate::core::types::{TransformHandle, NORMAL_TIME_SCALE};
use crate::world::{guard, EffectSink, HostFault};

/// What the world should look like after this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesiredState {
    pub time_scale: f32,
    pub camera_mode: CameraMode,
    pub camera_target: Option<TransformHandle>,
    pub mesh_visible: bool,
    pub weapon_blocked: bool,
}

impl DesiredState {
    /// Known-safe state written by the fatal path
    pub fn safe_defaults() -> Self {
        Self {
            time_scale: NORMAL_TIME_SCALE,
            camera_mode: CameraMode::Idle,
            camera_target: None,
            mesh_visible: false,
            weapon_blocked: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AppliedState {
    time_scale: Option<f32>,
    camera: Option<(CameraMode, Option<TransformHandle>)>,
    mesh_visible: Option<bool>,
    weapon_blocked: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub writes: u32,
    pub absorbed: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    applied: AppliedState,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the host in line with `desired`. Stops at the first genuine
    /// fault.
    pub fn reconcile(&mut self, sink: &mut dyn EffectSink, desired: &DesiredState) -> Result<ReconcileOutcome, HostFault> {
        let mut outcome = ReconcileOutcome::default();
        let safe = DesiredState::safe_defaults();

        if desired.time_scale == safe.time_scale || self.applied.time_scale != Some(desired.time_scale) {
            let written = guard("set_time_scale", sink.set_time_scale(desired.time_scale))?;
            self.record(&mut outcome, written.is_some());
            if written.is_some() {
                self.applied.time_scale = Some(desired.time_scale);
            }
        }

        let camera = (desired.camera_mode, desired.camera_target);
        if camera == (safe.camera_mode, safe.camera_target) || self.applied.camera != Some(camera) {
            let written = guard("set_camera_mode", sink.set_camera_mode(camera.0, camera.1))?;
            self.record(&mut outcome, written.is_some());
            if written.is_some() {
                self.applied.camera = Some(camera);
            }
        }

        if desired.mesh_visible == safe.mesh_visible || self.applied.mesh_visible != Some(desired.mesh_visible) {
            let written = guard("set_mesh_visibility", sink.set_mesh_visibility(desired.mesh_visible))?;
            self.record(&mut outcome, written.is_some());
            if written.is_some() {
                self.applied.mesh_visible = Some(desired.mesh_visible);
            }
        }

        if desired.weapon_blocked == safe.weapon_blocked || self.applied.weapon_blocked != Some(desired.weapon_blocked) {
            let written = guard(
                "set_weapon_fire_blocked",
                sink.set_weapon_fire_blocked(desired.weapon_blocked),
            )?;
            self.record(&mut outcome, written.is_some());
            if written.is_some() {
                self.applied.weapon_blocked = Some(desired.weapon_blocked);
            }
        }

        Ok(outcome)
    }

    /// Write every safe default regardless of the cache. Each write is
    /// attempted even if an earlier one fails; the failures are returned.
    pub fn force_safe_defaults(&mut self, sink: &mut dyn EffectSink) -> Vec<HostFault> {
        let safe = DesiredState::safe_defaults();
        let mut failures = Vec::new();
        self.applied = AppliedState::default();

        match sink.set_time_scale(safe.time_scale) {
            Ok(()) => self.applied.time_scale = Some(safe.time_scale),
            Err(fault) => failures.push(fault),
        }
        match sink.set_camera_mode(safe.camera_mode, safe.camera_target) {
            Ok(()) => self.applied.camera = Some((safe.camera_mode, safe.camera_target)),
            Err(fault) => failures.push(fault),
        }
        match sink.set_mesh_visibility(safe.mesh_visible) {
            Ok(()) => self.applied.mesh_visible = Some(safe.mesh_visible),
            Err(fault) => failures.push(fault),
        }
        match sink.set_weapon_fire_blocked(safe.weapon_blocked) {
            Ok(()) => self.applied.weapon_blocked = Some(safe.weapon_blocked),
            Err(fault) => failures.push(fault),
        }

        failures
    }

    /// Forget what the host holds; the next reconcile rewrites everything
    pub fn invalidate(&mut self) {
        self.applied = AppliedState::default();
    }

    fn record(&self, outcome: &mut ReconcileOutcome, written: bool) {
        if written {
            outcome.writes += 1;
        } else {
            outcome.absorbed += 1;
        }
    }
}
