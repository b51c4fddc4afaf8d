//! Scripted event replay for tuning presets offline
//!
//! A script is a JSON list of steps: gameplay events, world changes and
//! `advance` steps that pump frames. The director runs against the
//! in-memory sink and world so every write can be inspected.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{BodyPart, EntityId, ProjectileHandle, Timestamp, TransformHandle};
use crate::director::{DamageEvent, Director, FrameReport, KillCause, ProjectileShot};
use crate::trigger::{Arbitration, TriggerKind};
use crate::world::{HostFault, ProjectileStatus, RaycastHit, RecordingSink, ScriptedWorld, SinkOp};

pub type ReplayDirector = Director<RecordingSink, ScriptedWorld>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Damage(DamageEvent),
    Kill {
        target: EntityId,
        #[serde(default)]
        cause: KillCause,
    },
    Dismember {
        target: EntityId,
        part: BodyPart,
    },
    Parry {
        defender: EntityId,
    },
    EntityDeath {
        target: EntityId,
    },
    ProjectileFired(ProjectileShot),
    CaptureRagdoll {
        entity: EntityId,
        transform: TransformHandle,
    },
    Despawn {
        entity: EntityId,
    },
    ThrownRelease {
        entity: EntityId,
    },
    ThrownImpact {
        entity: EntityId,
    },
    SetProjectile {
        projectile: ProjectileHandle,
        status: ProjectileStatus,
    },
    SpawnTransform {
        transform: TransformHandle,
    },
    DestroyTransform {
        transform: TransformHandle,
    },
    RaycastHit {
        hit: Option<RaycastHit>,
    },
    InjectFault {
        op: SinkOp,
        fault: HostFault,
    },
    SetEnabled {
        enabled: bool,
    },
    SceneChange,
    Advance {
        frames: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_player")]
    pub player: EntityId,
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f32,
    pub steps: Vec<ScriptStep>,
}

fn default_player() -> EntityId {
    EntityId(1)
}

fn default_frame_dt() -> f32 {
    1.0 / 60.0
}

impl ReplayScript {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub frames: u64,
    /// Time and kind of every effect that fired
    pub fired: Vec<(Timestamp, TriggerKind)>,
    pub fatal_errors: u32,
}

/// Run every step. `on_frame` sees each pumped frame's report. Fatal frame
/// errors are logged and counted; the director restores itself on the
/// following frame.
pub fn run_script<F>(director: &mut ReplayDirector, script: &ReplayScript, mut on_frame: F) -> ReplaySummary
where
    F: FnMut(&FrameReport),
{
    let mut summary = ReplaySummary::default();

    for step in &script.steps {
        let arbitration = apply_step(director, step);
        if let Some(kind) = arbitration.and_then(|a| a.fired) {
            summary.fired.push((director.now(), kind));
        }

        if let ScriptStep::Advance { frames } = step {
            for _ in 0..*frames {
                summary.frames += 1;
                match director.on_frame_update(script.frame_dt) {
                    Ok(report) => on_frame(&report),
                    Err(err) => {
                        tracing::error!("Frame {} failed: {}", summary.frames, err);
                        summary.fatal_errors += 1;
                    }
                }
            }
        }
    }

    summary
}

fn apply_step(director: &mut ReplayDirector, step: &ScriptStep) -> Option<Arbitration> {
    match step {
        ScriptStep::Damage(event) => Some(director.on_damage(*event)),
        ScriptStep::Kill { target, cause } => Some(director.on_kill(*target, *cause)),
        ScriptStep::Dismember { target, part } => Some(director.on_dismember(*target, *part)),
        ScriptStep::Parry { defender } => Some(director.on_parry(*defender)),
        ScriptStep::EntityDeath { target } => Some(director.on_entity_death(*target)),
        ScriptStep::ProjectileFired(shot) => {
            if !director.on_projectile_fired(*shot) {
                tracing::debug!("Projectile {:?} did not arm the ride cam", shot.projectile);
            }
            None
        }
        ScriptStep::CaptureRagdoll { entity, transform } => {
            director.capture_ragdoll_target(*entity, *transform);
            None
        }
        ScriptStep::Despawn { entity } => {
            director.on_entity_despawned(*entity);
            None
        }
        ScriptStep::ThrownRelease { entity } => {
            director.on_thrown_release(*entity);
            None
        }
        ScriptStep::ThrownImpact { entity } => {
            director.on_thrown_impact(*entity);
            None
        }
        ScriptStep::SetProjectile { projectile, status } => {
            director.probe_mut().set_projectile(*projectile, *status);
            None
        }
        ScriptStep::SpawnTransform { transform } => {
            director.probe_mut().spawn_transform(*transform);
            None
        }
        ScriptStep::DestroyTransform { transform } => {
            director.probe_mut().destroy_transform(*transform);
            None
        }
        ScriptStep::RaycastHit { hit } => {
            director.probe_mut().set_raycast_hit(*hit);
            None
        }
        ScriptStep::InjectFault { op, fault } => {
            director.sink_mut().inject_fault(*op, fault.clone());
            None
        }
        ScriptStep::SetEnabled { enabled } => {
            director.set_mod_enabled(*enabled);
            None
        }
        ScriptStep::SceneChange => {
            director.on_scene_change();
            None
        }
        ScriptStep::Advance { .. } => None,
    }
}
