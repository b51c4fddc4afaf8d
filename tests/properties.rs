//! Property tests for arbitration and the frame pump
//!
//! Random event streams must never leave the world slowed down or the
//! player's weapon locked once both state machines are idle.

use proptest::prelude::*;

use killcam::camera::CameraMode;
use killcam::core::config::{KillcamConfig, Preset};
use killcam::director::{DamageEvent, KillCause, ProjectileShot};
use killcam::effect::{EffectState, SessionEvent};
use killcam::trigger::{
    arbitrate, evaluate, ArbitrationContext, CooldownRegistry, EventTraits, FixedRoll, TriggerKind, TriggerResult,
};
use killcam::world::{AimRay, ProjectileStatus, RecordingSink, ScriptedWorld};
use killcam::{Director, EntityId, ProjectileHandle, TransformHandle};

const PLAYER: EntityId = EntityId(1);
const DT: f32 = 1.0 / 60.0;

fn kind_strategy() -> impl Strategy<Value = TriggerKind> {
    (0..TriggerKind::ALL.len()).prop_map(|i| TriggerKind::ALL[i])
}

fn state_strategy() -> impl Strategy<Value = EffectState> {
    prop_oneof![
        Just(EffectState::Idle),
        Just(EffectState::Triggered),
        Just(EffectState::Active),
        Just(EffectState::EasingOut),
    ]
}

/// Gameplay and world events the pump has to survive
#[derive(Debug, Clone)]
enum Op {
    Kill { target: u32, headshot: bool, critical: bool, last: bool },
    PlayerHit { health: f32 },
    PlayerDeath,
    EnemyHit { target: u32 },
    EntityDeath { target: u32 },
    Parry,
    Fire { index: u32, in_flight: bool },
    Collide { index: u32, struck: Option<u32> },
    Ragdoll { target: u32, alive: bool },
    DestroyRagdoll { target: u32 },
    Toggle { enabled: bool },
    SceneChange,
    Frames(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (2u32..6, any::<bool>(), any::<bool>(), any::<bool>())
            .prop_map(|(target, headshot, critical, last)| Op::Kill { target, headshot, critical, last }),
        (0.0f32..1.0).prop_map(|health| Op::PlayerHit { health }),
        Just(Op::PlayerDeath),
        (2u32..6).prop_map(|target| Op::EnemyHit { target }),
        (2u32..6).prop_map(|target| Op::EntityDeath { target }),
        Just(Op::Parry),
        (0u32..3, any::<bool>()).prop_map(|(index, in_flight)| Op::Fire { index, in_flight }),
        (0u32..3, proptest::option::of(2u32..6)).prop_map(|(index, struck)| Op::Collide { index, struck }),
        (2u32..6, any::<bool>()).prop_map(|(target, alive)| Op::Ragdoll { target, alive }),
        (2u32..6).prop_map(|target| Op::DestroyRagdoll { target }),
        any::<bool>().prop_map(|enabled| Op::Toggle { enabled }),
        Just(Op::SceneChange),
        (1u32..40).prop_map(Op::Frames),
    ]
}

fn fuzz_config(ride_cam: bool) -> KillcamConfig {
    let mut config = KillcamConfig {
        preset: Preset::Custom,
        ..KillcamConfig::default()
    };
    for kind in TriggerKind::ALL {
        config.triggers.get_mut(kind).chance = 100.0;
    }
    config.triggers.basic_kill.duration = 0.3;
    config.triggers.basic_kill.ease_out = 0.0;
    config.camera.ride_cam_enabled = ride_cam;
    config.camera.ride_cam_chance = 100.0;
    config
}

fn ragdoll_of(target: u32) -> TransformHandle {
    TransformHandle::new(100 + target, 0)
}

fn apply(director: &mut Director<RecordingSink, ScriptedWorld>, op: &Op) {
    match *op {
        Op::Kill { target, headshot, critical, last } => {
            let cause = KillCause {
                killer: Some(PLAYER),
                headshot,
                is_critical: critical,
                enemies_remaining: last.then_some(0),
                ..KillCause::default()
            };
            director.on_kill(EntityId(target), cause);
        }
        Op::PlayerHit { health } => {
            let event = DamageEvent {
                health_fraction: health,
                ..DamageEvent::new(PLAYER, Some(EntityId(9)), 10.0)
            };
            director.on_damage(event);
        }
        Op::PlayerDeath => {
            director.on_kill(PLAYER, KillCause::default());
        }
        Op::EnemyHit { target } => {
            director.on_damage(DamageEvent::new(EntityId(target), Some(PLAYER), 25.0));
        }
        Op::EntityDeath { target } => {
            director.on_entity_death(EntityId(target));
        }
        Op::Parry => {
            director.on_parry(PLAYER);
        }
        Op::Fire { index, in_flight } => {
            let projectile = ProjectileHandle::new(index, 0);
            if in_flight {
                let transform = TransformHandle::new(50 + index, 0);
                director
                    .probe_mut()
                    .set_projectile(projectile, ProjectileStatus::InFlight { transform });
            }
            director.on_projectile_fired(ProjectileShot {
                shooter: PLAYER,
                projectile,
                aim: AimRay::new(glam::Vec3::ZERO, glam::Vec3::Z, 50.0),
            });
        }
        Op::Collide { index, struck } => {
            director.probe_mut().set_projectile(
                ProjectileHandle::new(index, 0),
                ProjectileStatus::Collided { struck: struck.map(EntityId) },
            );
        }
        Op::Ragdoll { target, alive } => {
            if alive {
                director.probe_mut().spawn_transform(ragdoll_of(target));
            }
            director.capture_ragdoll_target(EntityId(target), ragdoll_of(target));
        }
        Op::DestroyRagdoll { target } => {
            director.probe_mut().destroy_transform(ragdoll_of(target));
        }
        Op::Toggle { enabled } => director.set_mod_enabled(enabled),
        Op::SceneChange => director.on_scene_change(),
        Op::Frames(_) => {}
    }
}

proptest! {
    /// A rejected evaluation leaves the cooldown registry untouched
    #[test]
    fn test_rejected_evaluation_is_pure_read(
        kind in kind_strategy(),
        state in state_strategy(),
        active in proptest::option::of(kind_strategy()),
        reserved in proptest::option::of((kind_strategy(), 0.0f64..10.0, 0.0f64..5.0, 0.0f64..5.0)),
        chance in 0.0f32..=100.0,
        roll in 0.0f32..100.0,
        now in 0.0f64..20.0,
        enabled in any::<bool>(),
        dot in any::<bool>(),
    ) {
        let mut config = KillcamConfig { preset: Preset::Custom, enabled, ..KillcamConfig::default() };
        config.triggers.get_mut(kind).chance = chance;

        let mut cooldowns = CooldownRegistry::new();
        if let Some((reserved_kind, at, global, per_kind)) = reserved {
            cooldowns.reserve(reserved_kind, at, global, per_kind);
        }
        let before = cooldowns.clone();

        let ctx = ArbitrationContext {
            config: &config,
            cooldowns: &cooldowns,
            session_state: state,
            active_kind: active,
            traits: EventTraits { dot, ..EventTraits::default() },
            now,
        };
        let result = evaluate(kind, &ctx, &mut FixedRoll(roll));

        prop_assert_eq!(&cooldowns, &before);
        if result.is_success() {
            prop_assert!(enabled);
            prop_assert!(cooldowns.is_ready(kind, now));
            prop_assert!(state == EffectState::Idle || state == EffectState::Triggered || state == EffectState::Active);
        }
    }

    /// The scan stops at the first success and never looks below it
    #[test]
    fn test_arbitration_short_circuits(
        candidates in proptest::collection::vec(kind_strategy(), 1..8),
        disabled in proptest::collection::vec(kind_strategy(), 0..4),
    ) {
        let mut config = KillcamConfig { preset: Preset::Custom, ..KillcamConfig::default() };
        for kind in TriggerKind::ALL {
            config.triggers.get_mut(kind).chance = 100.0;
        }
        for kind in &disabled {
            config.triggers.get_mut(*kind).enabled = false;
        }
        let cooldowns = CooldownRegistry::new();
        let ctx = ArbitrationContext {
            config: &config,
            cooldowns: &cooldowns,
            session_state: EffectState::Idle,
            active_kind: None,
            traits: EventTraits::default(),
            now: 1.0,
        };

        let arbitration = arbitrate(&candidates, &ctx, &mut FixedRoll(0.0));

        let priorities: Vec<u8> = arbitration.evaluated.iter().map(|(kind, _)| kind.priority()).collect();
        prop_assert!(priorities.windows(2).all(|pair| pair[0] > pair[1]));

        match arbitration.fired {
            Some(fired) => {
                prop_assert_eq!(arbitration.evaluated.last().copied(), Some((fired, TriggerResult::Success)));
                let best = candidates
                    .iter()
                    .filter(|kind| !disabled.contains(kind))
                    .map(|kind| kind.priority())
                    .max();
                prop_assert_eq!(Some(fired.priority()), best);
            }
            None => {
                prop_assert!(candidates.iter().all(|kind| disabled.contains(kind)));
            }
        }
    }

    /// Once ready, a kind stays ready until the next reservation
    #[test]
    fn test_cooldown_readiness_is_monotonic(
        kind in kind_strategy(),
        at in 0.0f64..100.0,
        global in 0.0f64..10.0,
        per_kind in 0.0f64..10.0,
        query in 0.0f64..200.0,
        later in 0.0f64..50.0,
    ) {
        let mut cooldowns = CooldownRegistry::new();
        cooldowns.reserve(kind, at, global, per_kind);

        prop_assert_eq!(cooldowns.kind_ready(kind, query), query >= at + per_kind);
        prop_assert_eq!(cooldowns.global_ready(query), query >= at + global);
        if cooldowns.is_ready(kind, query) {
            prop_assert!(cooldowns.is_ready(kind, query + later));
        }
    }

    /// Whatever happens, idle machines mean an untouched world
    #[test]
    fn test_pump_restores_world_when_idle(
        ops in proptest::collection::vec(op_strategy(), 1..60),
        ride_cam in any::<bool>(),
    ) {
        let mut director = Director::new(fuzz_config(ride_cam), RecordingSink::new(), ScriptedWorld::new(), PLAYER)
            .unwrap()
            .with_roller(Box::new(FixedRoll(0.0)));

        for op in &ops {
            apply(&mut director, op);
            let frames = match op {
                Op::Frames(n) => *n,
                _ => 1,
            };

            for _ in 0..frames {
                let report = director.on_frame_update(DT).unwrap();
                let sink = director.sink();

                prop_assert_eq!(report.weapon_blocked, report.camera_mode != CameraMode::Idle);
                prop_assert_eq!(director.weapon_fire_blocked(), director.camera_mode() != CameraMode::Idle);
                prop_assert_eq!(sink.weapon_blocked, report.weapon_blocked);
                prop_assert_eq!(sink.camera_mode, report.camera_mode);
                if report.effect_state == EffectState::Idle {
                    prop_assert_eq!(sink.time_scale, 1.0);
                }
                if report.camera_mode == CameraMode::Idle {
                    prop_assert!(!sink.weapon_blocked);
                    prop_assert!(!sink.mesh_visible);
                }
                prop_assert!(sink.time_scale >= 0.05 && sink.time_scale <= 1.0);
            }
        }

        // Everything settles once events stop
        for _ in 0..600 {
            director.on_frame_update(DT).unwrap();
        }
        prop_assert_eq!(director.effect_state(), EffectState::Idle);
        prop_assert_eq!(director.camera_mode(), CameraMode::Idle);
        prop_assert_eq!(director.sink().time_scale, 1.0);
        prop_assert!(!director.sink().weapon_blocked);
    }

    /// A cancel is always visible as EasingOut for at least one pump
    #[test]
    fn test_cancel_passes_through_easing_out(
        kind_index in 0usize..3,
        duration in 0.5f64..3.0,
        ease_out in 0.0f64..1.0,
        frames_before in 0u32..20,
    ) {
        let mut config = fuzz_config(false);
        let kind = [TriggerKind::BasicKill, TriggerKind::Headshot, TriggerKind::Critical][kind_index];
        {
            let settings = config.triggers.get_mut(kind);
            settings.duration = duration;
            settings.ease_out = ease_out;
        }
        let mut director = Director::new(config, RecordingSink::new(), ScriptedWorld::new(), PLAYER)
            .unwrap()
            .with_roller(Box::new(FixedRoll(0.0)));

        let cause = KillCause {
            killer: Some(PLAYER),
            headshot: kind == TriggerKind::Headshot,
            is_critical: kind == TriggerKind::Critical,
            ..KillCause::default()
        };
        prop_assert_eq!(director.on_kill(EntityId(7), cause).fired, Some(kind));
        for _ in 0..frames_before {
            director.on_frame_update(DT).unwrap();
        }

        director.on_kill(PLAYER, KillCause::default());
        let report = director.on_frame_update(DT).unwrap();
        prop_assert_eq!(report.effect_state, EffectState::EasingOut);
        let no_session_ended = report
            .session_events
            .iter()
            .all(|event| !matches!(event, SessionEvent::Ended { .. }));
        prop_assert!(no_session_ended);
    }
}
