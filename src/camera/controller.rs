//! Camera mode state machine
//!
//! Idle -> PredictiveArmed -> TrackingProjectile -> TrackingRagdoll ->
//! Returning -> Idle. Projectile and ragdoll bindings are back-references:
//! every tick re-validates them through the `WorldProbe` and a stale handle
//! sends the camera to Returning. Returning always lasts at least one tick.

use serde::{Deserialize, Serialize};

use crate::camera::{CameraMode, RagdollTargetTable};
use crate::core::config::CameraConfig;
use crate::core::types::{EntityId, ProjectileHandle, Timestamp, TransformHandle};
use crate::world::{ProjectileStatus, WorldProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    /// Bound transform no longer exists
    TargetGone,
    /// Tracking duration budget spent
    Timeout,
    /// Ragdoll never showed up within the poll budget
    NoRagdoll,
    /// Projectile hit nothing we can follow
    ProjectileLost,
    /// No projectile appeared within the arm budget
    ArmExpired,
    /// The effect that requested the follow cam ended
    EffectEnded,
    /// External cancellation
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraTransition {
    pub from: CameraMode,
    pub to: CameraMode,
    pub reason: Option<ReturnReason>,
}

/// Waiting for a ragdoll entry that has not been captured yet
#[derive(Debug, Clone, Copy, PartialEq)]
struct RagdollPoll {
    entity: EntityId,
    frames_left: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CameraController {
    mode: CameraMode,
    bound_projectile: Option<ProjectileHandle>,
    bound_ragdoll: Option<TransformHandle>,
    /// Camera target while following a projectile
    projectile_transform: Option<TransformHandle>,
    target_entity: Option<EntityId>,
    poll: Option<RagdollPoll>,
    arm_frames_left: u32,
    track_deadline: Timestamp,
    return_ends_at: Timestamp,
    return_hold: bool,
    /// Armed by a slow-motion effect rather than a projectile launch
    follows_effect: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == CameraMode::Idle
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        self.target_entity
    }

    pub fn bound_projectile(&self) -> Option<ProjectileHandle> {
        self.bound_projectile
    }

    pub fn bound_ragdoll(&self) -> Option<TransformHandle> {
        self.bound_ragdoll
    }

    pub fn follows_effect(&self) -> bool {
        self.follows_effect
    }

    /// Weapon fire is blocked in every mode except Idle
    pub fn weapon_blocked(&self) -> bool {
        self.mode != CameraMode::Idle
    }

    /// Mode and transform the host camera should use
    pub fn camera_request(&self) -> (CameraMode, Option<TransformHandle>) {
        let target = match self.mode {
            CameraMode::TrackingProjectile => self.projectile_transform,
            CameraMode::TrackingRagdoll => self.bound_ragdoll,
            _ => None,
        };
        (self.mode, target)
    }

    /// Projectile launched and the ride-cam roll passed. Arming does not
    /// depend on the aim raycast finding anything.
    pub fn arm_predictive(
        &mut self,
        projectile: ProjectileHandle,
        predicted_target: Option<EntityId>,
        config: &CameraConfig,
    ) -> Option<CameraTransition> {
        if self.mode != CameraMode::Idle {
            return None;
        }

        self.bound_projectile = Some(projectile);
        self.target_entity = predicted_target;
        self.arm_frames_left = config.predictive_arm_frames.max(1);
        self.follows_effect = false;
        tracing::info!(
            "Ride cam armed for projectile {:?} (predicted target: {:?})",
            projectile,
            predicted_target
        );
        Some(self.set_mode(CameraMode::PredictiveArmed, None))
    }

    /// Follow a kill target for a camera-eligible effect. Binds the ragdoll
    /// when it is already captured, otherwise polls for it. An effect follow
    /// that is still tracking or polling moves to the new target; a
    /// projectile ride or a return in progress is left alone.
    pub fn follow_kill(
        &mut self,
        target: EntityId,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
    ) -> Option<CameraTransition> {
        let retarget = self.follows_effect
            && matches!(self.mode, CameraMode::PredictiveArmed | CameraMode::TrackingRagdoll);
        if self.mode != CameraMode::Idle && !retarget {
            return None;
        }

        self.poll = None;
        self.bound_ragdoll = None;
        self.follows_effect = true;
        self.target_entity = Some(target);
        Some(self.acquire_ragdoll(target, ragdolls, probe, config, now))
    }

    /// The effect driving the follow cam is over
    pub fn release_follow(&mut self, config: &CameraConfig, now: Timestamp) -> Option<CameraTransition> {
        if !self.follows_effect {
            return None;
        }
        match self.mode {
            CameraMode::Idle | CameraMode::Returning => None,
            _ => Some(self.begin_return(ReturnReason::EffectEnded, config, now, true)),
        }
    }

    /// External cancellation. Always goes through Returning.
    pub fn force_stop(&mut self, config: &CameraConfig, now: Timestamp) -> Option<CameraTransition> {
        match self.mode {
            CameraMode::Idle | CameraMode::Returning => None,
            _ => Some(self.begin_return(ReturnReason::Forced, config, now, true)),
        }
    }

    /// Fatal path: drop every binding and go straight to Idle
    pub fn force_reset(&mut self) -> Option<CameraTransition> {
        let from = self.mode;
        *self = Self::default();
        (from != CameraMode::Idle).then_some(CameraTransition {
            from,
            to: CameraMode::Idle,
            reason: None,
        })
    }

    /// Advance one frame. Transitions into Returning are not completed in
    /// the same tick.
    pub fn tick(
        &mut self,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
    ) -> Vec<CameraTransition> {
        let mut transitions = Vec::new();

        match self.mode {
            CameraMode::Idle => {}
            CameraMode::PredictiveArmed => self.tick_armed(ragdolls, probe, config, now, &mut transitions),
            CameraMode::TrackingProjectile => {
                self.tick_projectile(ragdolls, probe, config, now, &mut transitions)
            }
            CameraMode::TrackingRagdoll => {
                if let Some(transition) = self.tick_ragdoll(probe, config, now) {
                    transitions.push(transition);
                }
            }
            CameraMode::Returning => {
                if self.return_hold {
                    self.return_hold = false;
                } else if now >= self.return_ends_at {
                    transitions.push(self.finish_return());
                }
            }
        }

        transitions
    }

    fn tick_armed(
        &mut self,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
        transitions: &mut Vec<CameraTransition>,
    ) {
        if let Some(poll) = self.poll {
            transitions.extend(self.poll_ragdoll(poll, ragdolls, probe, config, now));
            return;
        }

        let Some(projectile) = self.bound_projectile else {
            transitions.push(self.begin_return(ReturnReason::ProjectileLost, config, now, false));
            return;
        };

        match probe.projectile_status(projectile) {
            ProjectileStatus::InFlight { transform } if probe.transform_alive(transform) => {
                self.projectile_transform = Some(transform);
                self.track_deadline = now + config.ragdoll_track_duration;
                transitions.push(self.set_mode(CameraMode::TrackingProjectile, None));
            }
            ProjectileStatus::InFlight { .. } => {
                self.arm_frames_left = self.arm_frames_left.saturating_sub(1);
                if self.arm_frames_left == 0 {
                    transitions.push(self.begin_return(ReturnReason::ArmExpired, config, now, false));
                }
            }
            ProjectileStatus::Collided { struck } => {
                let target = struck.or(self.target_entity);
                transitions.push(self.impact(target, ragdolls, probe, config, now));
            }
            ProjectileStatus::Destroyed => {
                let target = self.target_entity;
                transitions.push(self.impact(target, ragdolls, probe, config, now));
            }
        }
    }

    fn tick_projectile(
        &mut self,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
        transitions: &mut Vec<CameraTransition>,
    ) {
        let Some(projectile) = self.bound_projectile else {
            transitions.push(self.begin_return(ReturnReason::ProjectileLost, config, now, false));
            return;
        };

        match probe.projectile_status(projectile) {
            ProjectileStatus::InFlight { transform } if probe.transform_alive(transform) => {
                self.projectile_transform = Some(transform);
                if now >= self.track_deadline {
                    transitions.push(self.begin_return(ReturnReason::Timeout, config, now, false));
                }
            }
            ProjectileStatus::InFlight { .. } | ProjectileStatus::Destroyed => {
                let target = self.target_entity;
                transitions.push(self.impact(target, ragdolls, probe, config, now));
            }
            ProjectileStatus::Collided { struck } => {
                let target = struck.or(self.target_entity);
                transitions.push(self.impact(target, ragdolls, probe, config, now));
            }
        }
    }

    fn tick_ragdoll(&mut self, probe: &dyn WorldProbe, config: &CameraConfig, now: Timestamp) -> Option<CameraTransition> {
        let alive = self.bound_ragdoll.is_some_and(|transform| probe.transform_alive(transform));
        if !alive {
            tracing::warn!(
                "Ragdoll transform for {:?} is gone, returning camera",
                self.target_entity
            );
            return Some(self.begin_return(ReturnReason::TargetGone, config, now, false));
        }
        if now >= self.track_deadline {
            return Some(self.begin_return(ReturnReason::Timeout, config, now, false));
        }
        None
    }

    /// Projectile is done: move on to the struck body if we can find it
    fn impact(
        &mut self,
        target: Option<EntityId>,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
    ) -> CameraTransition {
        self.bound_projectile = None;
        self.projectile_transform = None;

        match target {
            Some(entity) => {
                self.target_entity = Some(entity);
                self.acquire_ragdoll(entity, ragdolls, probe, config, now)
            }
            None => self.begin_return(ReturnReason::ProjectileLost, config, now, false),
        }
    }

    fn acquire_ragdoll(
        &mut self,
        entity: EntityId,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
    ) -> CameraTransition {
        match ragdolls.lookup(entity).filter(|transform| probe.transform_alive(*transform)) {
            Some(transform) => self.bind_ragdoll(transform, config, now),
            None => {
                self.poll = Some(RagdollPoll {
                    entity,
                    frames_left: config.ragdoll_poll_frames,
                });
                tracing::debug!("Ragdoll for {:?} not captured yet, polling", entity);
                self.set_mode(CameraMode::PredictiveArmed, None)
            }
        }
    }

    fn poll_ragdoll(
        &mut self,
        poll: RagdollPoll,
        ragdolls: &RagdollTargetTable,
        probe: &dyn WorldProbe,
        config: &CameraConfig,
        now: Timestamp,
    ) -> Option<CameraTransition> {
        if let Some(transform) = ragdolls
            .lookup(poll.entity)
            .filter(|transform| probe.transform_alive(*transform))
        {
            return Some(self.bind_ragdoll(transform, config, now));
        }

        if poll.frames_left == 0 {
            return Some(self.begin_return(ReturnReason::NoRagdoll, config, now, false));
        }
        self.poll = Some(RagdollPoll {
            frames_left: poll.frames_left - 1,
            ..poll
        });
        None
    }

    fn bind_ragdoll(&mut self, transform: TransformHandle, config: &CameraConfig, now: Timestamp) -> CameraTransition {
        self.poll = None;
        self.bound_ragdoll = Some(transform);
        self.track_deadline = now + config.ragdoll_track_duration;
        self.set_mode(CameraMode::TrackingRagdoll, None)
    }

    fn begin_return(&mut self, reason: ReturnReason, config: &CameraConfig, now: Timestamp, hold: bool) -> CameraTransition {
        self.poll = None;
        self.bound_projectile = None;
        self.projectile_transform = None;
        self.bound_ragdoll = None;
        self.return_ends_at = now + config.return_blend_duration.max(0.0);
        self.return_hold = hold;
        self.set_mode(CameraMode::Returning, Some(reason))
    }

    fn finish_return(&mut self) -> CameraTransition {
        let from = self.mode;
        *self = Self::default();
        tracing::info!("Camera returned to first person");
        CameraTransition {
            from,
            to: CameraMode::Idle,
            reason: None,
        }
    }

    fn set_mode(&mut self, to: CameraMode, reason: Option<ReturnReason>) -> CameraTransition {
        let from = self.mode;
        self.mode = to;
        match reason {
            Some(reason) => tracing::info!("Camera {:?} -> {:?} ({:?})", from, to, reason),
            None => tracing::info!("Camera {:?} -> {:?}", from, to),
        }
        CameraTransition { from, to, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ScriptedWorld;

    const DT: Timestamp = 1.0 / 60.0;

    fn config() -> CameraConfig {
        CameraConfig {
            ride_cam_enabled: true,
            predictive_arm_frames: 3,
            ragdoll_poll_frames: 2,
            ragdoll_track_duration: 1.0,
            return_blend_duration: 0.0,
            ..CameraConfig::default()
        }
    }

    #[test]
    fn test_arm_without_target_still_arms() {
        let mut camera = CameraController::new();
        let transition = camera.arm_predictive(ProjectileHandle::new(1, 0), None, &config());

        assert_eq!(transition.map(|t| t.to), Some(CameraMode::PredictiveArmed));
        assert_eq!(camera.mode(), CameraMode::PredictiveArmed);
        assert!(camera.weapon_blocked());
    }

    #[test]
    fn test_arm_ignored_when_busy() {
        let mut camera = CameraController::new();
        camera.arm_predictive(ProjectileHandle::new(1, 0), None, &config());
        assert!(camera.arm_predictive(ProjectileHandle::new(2, 0), None, &config()).is_none());
        assert_eq!(camera.bound_projectile(), Some(ProjectileHandle::new(1, 0)));
    }

    #[test]
    fn test_projectile_to_ragdoll_flow() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let mut ragdolls = RagdollTargetTable::new();
        let arrow = ProjectileHandle::new(1, 0);
        let arrow_body = TransformHandle::new(10, 0);
        let zombie = EntityId(7);
        let corpse = TransformHandle::new(20, 0);

        let mut camera = CameraController::new();
        camera.arm_predictive(arrow, None, &config);

        world.set_projectile(arrow, ProjectileStatus::InFlight { transform: arrow_body });
        camera.tick(&ragdolls, &world, &config, DT);
        assert_eq!(camera.mode(), CameraMode::TrackingProjectile);
        assert_eq!(camera.camera_request(), (CameraMode::TrackingProjectile, Some(arrow_body)));

        world.set_projectile(arrow, ProjectileStatus::Collided { struck: Some(zombie) });
        world.spawn_transform(corpse);
        ragdolls.capture(zombie, corpse);
        camera.tick(&ragdolls, &world, &config, 2.0 * DT);

        assert_eq!(camera.mode(), CameraMode::TrackingRagdoll);
        assert_eq!(camera.bound_ragdoll(), Some(corpse));
        assert_eq!(camera.bound_projectile(), None);
    }

    #[test]
    fn test_impact_polls_for_late_ragdoll() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let mut ragdolls = RagdollTargetTable::new();
        let arrow = ProjectileHandle::new(1, 0);
        let zombie = EntityId(7);
        let corpse = TransformHandle::new(20, 0);

        let mut camera = CameraController::new();
        camera.arm_predictive(arrow, None, &config);
        world.set_projectile(arrow, ProjectileStatus::Collided { struck: Some(zombie) });

        camera.tick(&ragdolls, &world, &config, DT);
        assert_eq!(camera.mode(), CameraMode::PredictiveArmed);

        // Death processed a frame later
        world.spawn_transform(corpse);
        ragdolls.capture(zombie, corpse);
        camera.tick(&ragdolls, &world, &config, 2.0 * DT);
        assert_eq!(camera.mode(), CameraMode::TrackingRagdoll);
    }

    #[test]
    fn test_ragdoll_poll_budget_runs_out() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let ragdolls = RagdollTargetTable::new();
        let arrow = ProjectileHandle::new(1, 0);

        let mut camera = CameraController::new();
        camera.arm_predictive(arrow, None, &config);
        world.set_projectile(arrow, ProjectileStatus::Collided { struck: Some(EntityId(7)) });

        let mut now = 0.0;
        let mut frames = 0;
        while camera.mode() == CameraMode::PredictiveArmed {
            now += DT;
            camera.tick(&ragdolls, &world, &config, now);
            frames += 1;
            assert!(frames < 10, "poll never gave up");
        }
        assert_eq!(camera.mode(), CameraMode::Returning);
    }

    #[test]
    fn test_miss_with_no_target_returns() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let ragdolls = RagdollTargetTable::new();
        let arrow = ProjectileHandle::new(1, 0);

        let mut camera = CameraController::new();
        camera.arm_predictive(arrow, None, &config);
        world.set_projectile(arrow, ProjectileStatus::Collided { struck: None });

        let transitions = camera.tick(&ragdolls, &world, &config, DT);
        assert_eq!(transitions[0].reason, Some(ReturnReason::ProjectileLost));
        assert_eq!(camera.mode(), CameraMode::Returning);
    }

    #[test]
    fn test_destroyed_ragdoll_returns_without_panic() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let mut ragdolls = RagdollTargetTable::new();
        let corpse = TransformHandle::new(20, 0);
        world.spawn_transform(corpse);
        ragdolls.capture(EntityId(7), corpse);

        let mut camera = CameraController::new();
        camera.follow_kill(EntityId(7), &ragdolls, &world, &config, 0.0);
        assert_eq!(camera.mode(), CameraMode::TrackingRagdoll);

        world.destroy_transform(corpse);
        let transitions = camera.tick(&ragdolls, &world, &config, DT);

        assert_eq!(camera.mode(), CameraMode::Returning);
        assert_eq!(transitions[0].reason, Some(ReturnReason::TargetGone));
        assert_eq!(camera.camera_request(), (CameraMode::Returning, None));
    }

    #[test]
    fn test_tracking_times_out() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let mut ragdolls = RagdollTargetTable::new();
        let corpse = TransformHandle::new(20, 0);
        world.spawn_transform(corpse);
        ragdolls.capture(EntityId(7), corpse);

        let mut camera = CameraController::new();
        camera.follow_kill(EntityId(7), &ragdolls, &world, &config, 0.0);

        assert!(camera.tick(&ragdolls, &world, &config, 0.5).is_empty());
        let transitions = camera.tick(&ragdolls, &world, &config, 1.0);
        assert_eq!(transitions[0].reason, Some(ReturnReason::Timeout));
    }

    #[test]
    fn test_returning_blends_then_idles() {
        let config = CameraConfig {
            return_blend_duration: 0.25,
            ..config()
        };
        let world = ScriptedWorld::new();
        let ragdolls = RagdollTargetTable::new();

        let mut camera = CameraController::new();
        camera.arm_predictive(ProjectileHandle::new(1, 0), None, &config);
        camera.force_stop(&config, 1.0);
        assert_eq!(camera.mode(), CameraMode::Returning);

        camera.tick(&ragdolls, &world, &config, 1.0);
        camera.tick(&ragdolls, &world, &config, 1.1);
        assert_eq!(camera.mode(), CameraMode::Returning);

        camera.tick(&ragdolls, &world, &config, 1.25);
        assert!(camera.is_idle());
        assert!(!camera.weapon_blocked());
    }

    #[test]
    fn test_force_stop_observed_for_one_tick() {
        let config = config();
        let world = ScriptedWorld::new();
        let ragdolls = RagdollTargetTable::new();

        let mut camera = CameraController::new();
        camera.arm_predictive(ProjectileHandle::new(1, 0), None, &config);
        camera.force_stop(&config, 0.0);

        // Zero blend, but the first tick still reports Returning
        camera.tick(&ragdolls, &world, &config, 0.0);
        assert_eq!(camera.mode(), CameraMode::Returning);
        camera.tick(&ragdolls, &world, &config, DT);
        assert!(camera.is_idle());
    }

    #[test]
    fn test_release_follow_only_for_effect_cam() {
        let config = config();
        let world = ScriptedWorld::new();
        let ragdolls = RagdollTargetTable::new();

        let mut camera = CameraController::new();
        camera.arm_predictive(ProjectileHandle::new(1, 0), None, &config);
        assert!(camera.release_follow(&config, 0.0).is_none());

        let mut follow = CameraController::new();
        follow.follow_kill(EntityId(3), &ragdolls, &world, &config, 0.0);
        assert!(follow.follows_effect());
        let transition = follow.release_follow(&config, 0.1);
        assert_eq!(transition.and_then(|t| t.reason), Some(ReturnReason::EffectEnded));
    }

    #[test]
    fn test_effect_follow_moves_to_new_kill() {
        let config = config();
        let mut world = ScriptedWorld::new();
        let mut ragdolls = RagdollTargetTable::new();
        let first = TransformHandle::new(20, 0);
        let second = TransformHandle::new(21, 0);
        world.spawn_transform(first);
        world.spawn_transform(second);
        ragdolls.capture(EntityId(3), first);
        ragdolls.capture(EntityId(4), second);

        let mut camera = CameraController::new();
        camera.follow_kill(EntityId(3), &ragdolls, &world, &config, 0.0);
        assert_eq!(camera.bound_ragdoll(), Some(first));

        let transition = camera.follow_kill(EntityId(4), &ragdolls, &world, &config, 0.5);
        assert_eq!(transition.map(|t| t.to), Some(CameraMode::TrackingRagdoll));
        assert_eq!(camera.target_entity(), Some(EntityId(4)));
        assert_eq!(camera.bound_ragdoll(), Some(second));
    }

    #[test]
    fn test_projectile_ride_keeps_its_target() {
        let config = config();
        let world = ScriptedWorld::new();
        let ragdolls = RagdollTargetTable::new();
        let arrow = ProjectileHandle::new(1, 0);

        let mut camera = CameraController::new();
        camera.arm_predictive(arrow, Some(EntityId(2)), &config);

        assert!(camera.follow_kill(EntityId(4), &ragdolls, &world, &config, 0.0).is_none());
        assert_eq!(camera.bound_projectile(), Some(arrow));
        assert_eq!(camera.target_entity(), Some(EntityId(2)));
    }

    #[test]
    fn test_force_reset_clears_everything() {
        let mut camera = CameraController::new();
        camera.arm_predictive(ProjectileHandle::new(1, 0), Some(EntityId(2)), &config());
        camera.force_reset();

        assert!(camera.is_idle());
        assert_eq!(camera.target_entity(), None);
        assert_eq!(camera.bound_projectile(), None);
        assert!(!camera.weapon_blocked());
    }
}
