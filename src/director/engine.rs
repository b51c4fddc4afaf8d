//! The orchestrator: event intake plus the per-frame pump
//!
//! One `Director` is built at mod load and dropped at unload. Everything
//! runs on the host's update thread; intake calls may request transitions
//! but only `on_frame_update` writes shared world state.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::camera::{CameraController, CameraMode, CameraTransition, RagdollTargetTable};
use crate::core::config::KillcamConfig;
use crate::core::error::{KillcamError, Result};
use crate::core::types::{
    BodyPart, EntityId, Timestamp, TransformHandle, MIN_TIME_SCALE, NORMAL_TIME_SCALE,
};
use crate::director::classify::{death_candidates, dismember_candidates, kill_candidates};
use crate::director::events::{DamageEvent, HitRecord, KillCause, ProjectileShot};
use crate::director::reconcile::{DesiredState, Reconciler};
use crate::director::stats::DirectorStats;
use crate::director::throws::ThrowTracker;
use crate::effect::{dynamic_time_scale, EffectParams, EffectSession, EffectState, SessionEvent};
use crate::trigger::{
    arbitrate, Arbitration, ArbitrationContext, ChanceRoll, CooldownRegistry, EventTraits, TriggerKind,
};
use crate::world::{guard_with, AimRay, EffectSink, HostFault, WorldProbe};

/// How long the player's last hit on an entity is remembered
pub const HIT_MEMORY: Timestamp = 10.0;

/// What happened during one pump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub now: Timestamp,
    pub effect_state: EffectState,
    pub active_kind: Option<TriggerKind>,
    pub camera_mode: CameraMode,
    pub time_scale: f32,
    pub weapon_blocked: bool,
    pub session_events: Vec<SessionEvent>,
    pub camera_transitions: Vec<CameraTransition>,
    pub absorbed_faults: u32,
}

pub struct Director<S: EffectSink, P: WorldProbe> {
    config: KillcamConfig,
    sink: S,
    probe: P,
    roller: Box<dyn ChanceRoll>,
    player: EntityId,
    now: Timestamp,
    cooldowns: CooldownRegistry,
    session: EffectSession,
    camera: CameraController,
    ragdolls: RagdollTargetTable,
    throws: ThrowTracker,
    /// Player's most recent hit per entity
    hits: AHashMap<EntityId, HitRecord>,
    /// Kills already arbitrated, for death-notification dedup
    recent_kills: AHashMap<EntityId, Timestamp>,
    player_health: f32,
    last_stand_spent: bool,
    reconciler: Reconciler,
    safe_reset_pending: bool,
    stats: DirectorStats,
}

impl<S: EffectSink, P: WorldProbe> Director<S, P> {
    pub fn new(config: KillcamConfig, sink: S, probe: P, player: EntityId) -> Result<Self> {
        config.validate().map_err(KillcamError::InvalidConfig)?;
        let roller: Box<dyn ChanceRoll> = Box::new(ChaCha8Rng::seed_from_u64(config.seed));

        tracing::info!(
            "Killcam director ready (preset {:?}, enabled: {})",
            config.preset,
            config.enabled
        );

        Ok(Self {
            config,
            sink,
            probe,
            roller,
            player,
            now: 0.0,
            cooldowns: CooldownRegistry::new(),
            session: EffectSession::new(),
            camera: CameraController::new(),
            ragdolls: RagdollTargetTable::new(),
            throws: ThrowTracker::new(),
            hits: AHashMap::new(),
            recent_kills: AHashMap::new(),
            player_health: 1.0,
            last_stand_spent: false,
            reconciler: Reconciler::new(),
            safe_reset_pending: false,
            stats: DirectorStats::default(),
        })
    }

    /// Replace the chance source
    pub fn with_roller(mut self, roller: Box<dyn ChanceRoll>) -> Self {
        self.roller = roller;
        self
    }

    pub fn config(&self) -> &KillcamConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    /// The local player entity changed (respawn, level load)
    pub fn set_player(&mut self, player: EntityId) {
        self.player = player;
        self.player_health = 1.0;
        self.last_stand_spent = false;
    }

    pub fn effect_state(&self) -> EffectState {
        self.session.state()
    }

    pub fn active_kind(&self) -> Option<TriggerKind> {
        self.session.active_kind()
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera.mode()
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    pub fn ragdolls(&self) -> &RagdollTargetTable {
        &self.ragdolls
    }

    pub fn stats(&self) -> &DirectorStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut P {
        &mut self.probe
    }

    /// Consulted by the weapon-firing hook before every attack
    pub fn weapon_fire_blocked(&self) -> bool {
        self.camera.weapon_blocked()
    }

    // ------------------------------------------------------------------
    // Event intake
    // ------------------------------------------------------------------

    pub fn on_damage(&mut self, event: DamageEvent) -> Arbitration {
        if event.target == self.player {
            return self.on_player_damaged(&event);
        }

        if event.source == Some(self.player) && event.was_alive {
            self.hits.insert(event.target, HitRecord::from_damage(&event, self.now));
        }
        Arbitration::default()
    }

    pub fn on_kill(&mut self, target: EntityId, cause: KillCause) -> Arbitration {
        if target == self.player {
            self.on_player_death();
            return Arbitration::default();
        }
        if self.already_handled(target) {
            tracing::debug!("Kill of {:?} already arbitrated", target);
            return Arbitration::default();
        }

        let credited = cause.killer == Some(self.player);
        let thrown = !credited
            && self
                .throws
                .take_recent_impact(target, self.now, self.config.thrown_impact_window);
        self.recent_kills.insert(target, self.now);
        let last_hit = self.hits.remove(&target);
        if !credited && !thrown {
            tracing::debug!("Kill of {:?} not credited to the player", target);
            return Arbitration::default();
        }

        let damage = if cause.damage > 0.0 {
            cause.damage
        } else {
            last_hit.map_or(0.0, |hit| hit.strength)
        };

        if thrown {
            let traits = EventTraits {
                thrown: true,
                ..cause.traits
            };
            return self.offer(&[TriggerKind::BasicKill], traits, Some(target), damage);
        }

        let candidates = kill_candidates(&cause, last_hit.as_ref());
        self.offer(&candidates, cause.traits, Some(target), damage)
    }

    /// Fallback for kills the kill hook never reported
    pub fn on_entity_death(&mut self, target: EntityId) -> Arbitration {
        if target == self.player {
            self.on_player_death();
            return Arbitration::default();
        }
        if self.already_handled(target) {
            self.stats.deduplicated_deaths += 1;
            tracing::debug!("Death of {:?} already handled by kill hook", target);
            return Arbitration::default();
        }

        if self
            .throws
            .take_recent_impact(target, self.now, self.config.thrown_impact_window)
        {
            self.recent_kills.insert(target, self.now);
            let traits = EventTraits {
                thrown: true,
                ..EventTraits::default()
            };
            return self.offer(&[TriggerKind::BasicKill], traits, Some(target), 0.0);
        }

        let Some(hit) = self.hits.remove(&target) else {
            return Arbitration::default();
        };
        self.recent_kills.insert(target, self.now);
        self.offer(&death_candidates(&hit), hit.traits, Some(target), hit.strength)
    }

    /// Limb severed without killing
    pub fn on_dismember(&mut self, target: EntityId, part: BodyPart) -> Arbitration {
        if self.already_handled(target) {
            return Arbitration::default();
        }
        let Some(hit) = self.hits.get(&target).copied() else {
            return Arbitration::default();
        };
        self.offer(&dismember_candidates(part), hit.traits, None, hit.strength)
    }

    pub fn on_parry(&mut self, defender: EntityId) -> Arbitration {
        if defender != self.player {
            return Arbitration::default();
        }
        self.offer(&[TriggerKind::Parry], EventTraits::default(), None, 0.0)
    }

    /// Projectile launched. Arms the ride cam when the chance roll passes;
    /// the aim raycast only supplies a fallback target.
    pub fn on_projectile_fired(&mut self, shot: ProjectileShot) -> bool {
        let camera_config = &self.config.camera;
        if !self.config.enabled || !camera_config.ride_cam_enabled || !camera_config.predictive_aiming {
            return false;
        }
        if shot.shooter != self.player || !self.camera.is_idle() {
            return false;
        }

        let chance = camera_config.ride_cam_chance;
        if chance < 100.0 {
            let roll = self.roller.roll_percent();
            if !roll.is_finite() || roll >= chance {
                tracing::debug!("Ride cam roll failed ({:.1} >= {:.0})", roll, chance);
                return false;
            }
        }

        let ray = AimRay {
            max_distance: shot.aim.max_distance.min(camera_config.raycast_range),
            ..shot.aim
        };
        let predicted = self
            .probe
            .raycast(&ray)
            .and_then(|hit| hit.entity)
            .filter(|entity| *entity != self.player);

        self.camera
            .arm_predictive(shot.projectile, predicted, &self.config.camera)
            .is_some()
    }

    /// External death/ragdoll hook captured a body
    pub fn capture_ragdoll_target(&mut self, entity: EntityId, transform: TransformHandle) {
        if self.ragdolls.capture(entity, transform).is_some() {
            tracing::debug!("Ragdoll entry for {:?} replaced", entity);
        }
    }

    pub fn on_entity_despawned(&mut self, entity: EntityId) {
        self.ragdolls.evict(entity);
        self.hits.remove(&entity);
        self.throws.forget(entity);
    }

    pub fn on_thrown_release(&mut self, entity: EntityId) {
        if entity != self.player {
            self.throws.record_release(entity, self.now);
        }
    }

    pub fn on_thrown_impact(&mut self, entity: EntityId) {
        self.throws.record_impact(entity, self.now);
    }

    /// Run a host hook body, skipping the known transient null-reference
    /// defect and surfacing anything else
    pub fn run_host_hook<T, F>(&mut self, name: &str, hook: F) -> Result<Option<T>>
    where
        F: FnOnce() -> std::result::Result<T, HostFault>,
    {
        let outcome = guard_with(name, hook)?;
        if outcome.is_none() {
            self.stats.absorbed_faults += 1;
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Toggle the mod at runtime. Disabling eases everything out.
    pub fn set_mod_enabled(&mut self, enabled: bool) {
        if self.config.enabled == enabled {
            return;
        }
        self.config.enabled = enabled;
        tracing::info!("Killcam {}", if enabled { "enabled" } else { "disabled" });
        if !enabled {
            self.cancel_all();
        }
    }

    pub fn on_scene_change(&mut self) {
        self.cancel_all();
        self.ragdolls.clear();
        self.throws.clear();
        self.hits.clear();
        self.recent_kills.clear();
        self.player_health = 1.0;
        self.last_stand_spent = false;
    }

    /// Swap the settings snapshot between frames
    pub fn apply_config(&mut self, config: KillcamConfig) -> Result<()> {
        config.validate().map_err(KillcamError::InvalidConfig)?;
        let was_enabled = self.config.enabled;
        self.config = config;
        tracing::info!("Config applied (preset {:?})", self.config.preset);
        if was_enabled && !self.config.enabled {
            self.cancel_all();
        }
        Ok(())
    }

    /// Mod unload: restore the world synchronously
    pub fn shutdown(&mut self) -> Result<()> {
        self.session.force_reset();
        self.camera.force_reset();
        let failures = self.reconciler.force_safe_defaults(&mut self.sink);
        self.safe_reset_pending = !failures.is_empty();
        match failures.into_iter().next() {
            Some(fault) => Err(fault.into()),
            None => {
                tracing::info!("Killcam shut down, world state restored");
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame pump
    // ------------------------------------------------------------------

    pub fn on_frame_update(&mut self, delta_time: f32) -> Result<FrameReport> {
        let dt = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time as Timestamp
        } else {
            tracing::warn!("Ignoring invalid frame delta {}", delta_time);
            0.0
        };
        self.now += dt;
        let now = self.now;
        self.stats.frames += 1;

        if self.safe_reset_pending {
            self.restore_safe_defaults();
        }

        // 1. Expire bookkeeping
        self.cooldowns.expire(now, self.config.cooldown_retention);
        self.throws.cleanup(now);
        self.hits.retain(|_, hit| now - hit.at <= HIT_MEMORY);
        let dedup_window = self.config.kill_dedup_window;
        self.recent_kills.retain(|_, at| now - *at <= dedup_window);

        // 2. Effect session
        let session_events = self.session.tick(now);
        let mut camera_transitions = Vec::new();
        for event in &session_events {
            match *event {
                SessionEvent::EasingOut { .. } => {
                    camera_transitions.extend(self.camera.release_follow(&self.config.camera, now));
                }
                SessionEvent::Ended { kind } => {
                    let settings = self.config.trigger(kind);
                    self.cooldowns
                        .reserve(kind, now, self.config.global_cooldown, settings.cooldown);
                    tracing::info!("{} ended", kind.display_name());
                }
                SessionEvent::Activated { .. } | SessionEvent::ForcedReset { .. } => {}
            }
        }

        // 3. Camera
        camera_transitions.extend(self.camera.tick(&self.ragdolls, &self.probe, &self.config.camera, now));

        // 4. Reconcile shared state
        let desired = self.desired_state();
        let outcome = match self.reconciler.reconcile(&mut self.sink, &desired) {
            Ok(outcome) => outcome,
            Err(fault) => return Err(self.enter_fatal(fault)),
        };
        self.stats.absorbed_faults += u64::from(outcome.absorbed);

        Ok(FrameReport {
            now,
            effect_state: self.session.state(),
            active_kind: self.session.active_kind(),
            camera_mode: self.camera.mode(),
            time_scale: desired.time_scale,
            weapon_blocked: desired.weapon_blocked,
            session_events,
            camera_transitions,
            absorbed_faults: outcome.absorbed,
        })
    }

    /// State the world should be in right now
    pub fn desired_state(&self) -> DesiredState {
        let (camera_mode, camera_target) = self.camera.camera_request();
        let time_scale = if self.session.is_idle() {
            NORMAL_TIME_SCALE
        } else {
            self.session
                .time_scale_at(self.now)
                .clamp(MIN_TIME_SCALE, NORMAL_TIME_SCALE)
        };

        DesiredState {
            time_scale,
            camera_mode,
            camera_target,
            mesh_visible: self.config.camera.show_player_body && camera_mode.is_third_person(),
            weapon_blocked: self.camera.weapon_blocked(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn offer(
        &mut self,
        candidates: &[TriggerKind],
        traits: EventTraits,
        target: Option<EntityId>,
        damage: f32,
    ) -> Arbitration {
        let ctx = ArbitrationContext {
            config: &self.config,
            cooldowns: &self.cooldowns,
            session_state: self.session.state(),
            active_kind: self.session.active_kind(),
            traits,
            now: self.now,
        };
        let arbitration = arbitrate(candidates, &ctx, self.roller.as_mut());

        for (_, result) in &arbitration.evaluated {
            self.stats.record_result(*result);
        }
        if let Some(kind) = arbitration.fired {
            self.start_effect(kind, target, damage);
        }
        arbitration
    }

    fn start_effect(&mut self, kind: TriggerKind, target: Option<EntityId>, damage: f32) {
        let settings = self.config.trigger(kind);
        self.cooldowns
            .reserve(kind, self.now, self.config.global_cooldown, settings.cooldown);

        let mut time_scale = settings.clamped_time_scale();
        if self.config.dynamic_intensity {
            time_scale = dynamic_time_scale(time_scale, damage);
        }
        let params = EffectParams {
            time_scale,
            duration: settings.duration,
            ease_out: settings.ease_out,
            camera: settings.camera,
        };

        let displaced = match self.session.state() {
            EffectState::Triggered | EffectState::Active => self.session.active_kind(),
            EffectState::Idle | EffectState::EasingOut => None,
        };

        let Some(SessionEvent::Activated { camera, .. }) = self.session.fire(kind, params, self.now) else {
            tracing::warn!("{:?} passed arbitration but the session refused it", kind);
            return;
        };

        self.stats.record_fired(kind);
        tracing::info!(
            "{} slow motion {:.2}x for {:.2}s",
            kind.display_name(),
            time_scale,
            settings.duration
        );

        if let Some(previous) = displaced {
            // The pre-empted effect ends now; restart its window from here
            let previous_cooldown = self.config.trigger(previous).cooldown;
            self.cooldowns
                .reserve(previous, self.now, self.config.global_cooldown, previous_cooldown);
            tracing::debug!("{:?} pre-empted by {:?}", previous, kind);
        }

        if camera && self.config.camera.ride_cam_enabled {
            if let Some(target) = target {
                let follow = self
                    .camera
                    .follow_kill(target, &self.ragdolls, &self.probe, &self.config.camera, self.now);
                if follow.is_none() {
                    tracing::debug!(
                        "Camera busy in {:?}, not following {:?}",
                        self.camera.mode(),
                        target
                    );
                }
            }
        }
    }

    fn on_player_damaged(&mut self, event: &DamageEvent) -> Arbitration {
        if event.is_lethal() {
            self.on_player_death();
            return Arbitration::default();
        }

        let threshold = self.config.last_stand_health_threshold;
        let health = event.health_fraction;
        let crossed = self.player_health > threshold && health <= threshold && health > 0.0;

        let mut arbitration = Arbitration::default();
        if crossed && !self.last_stand_spent {
            self.last_stand_spent = true;
            arbitration = self.offer(&[TriggerKind::LastStand], EventTraits::default(), None, 0.0);
        }

        if health > threshold {
            self.last_stand_spent = false;
        }
        self.player_health = health;
        arbitration
    }

    fn on_player_death(&mut self) {
        tracing::info!("Player died, cancelling effects");
        self.cancel_all();
        self.player_health = 1.0;
        self.last_stand_spent = false;
    }

    fn cancel_all(&mut self) {
        self.session.cancel(self.now);
        self.camera.force_stop(&self.config.camera, self.now);
    }

    fn already_handled(&self, target: EntityId) -> bool {
        self.recent_kills
            .get(&target)
            .is_some_and(|at| self.now - *at <= self.config.kill_dedup_window)
    }

    fn enter_fatal(&mut self, fault: HostFault) -> KillcamError {
        tracing::error!("Reconciliation failed ({}); forcing safe defaults next frame", fault);
        self.session.force_reset();
        self.camera.force_reset();
        self.reconciler.invalidate();
        self.safe_reset_pending = true;
        self.stats.fatal_resets += 1;
        KillcamError::Host(fault)
    }

    fn restore_safe_defaults(&mut self) {
        let failures = self.reconciler.force_safe_defaults(&mut self.sink);
        if failures.is_empty() {
            self.safe_reset_pending = false;
            tracing::info!("Safe defaults restored");
        } else {
            for fault in &failures {
                tracing::error!("Safe default write failed: {}", fault);
            }
        }
    }
}
