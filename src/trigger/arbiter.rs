//! Trigger arbitration
//!
//! `evaluate` is a pure read of the config snapshot, cooldowns and session
//! state; the only thing it consumes is a chance roll, and only when every
//! other check has passed. Committing the cooldown and starting the effect
//! are the caller's next step.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::KillcamConfig;
use crate::core::types::{DamageType, Timestamp};
use crate::effect::EffectState;
use crate::trigger::{by_priority_desc, CooldownRegistry, TriggerKind, TriggerResult};

/// Source of probability rolls in `[0, 100)`
pub trait ChanceRoll {
    fn roll_percent(&mut self) -> f32;
}

impl ChanceRoll for ChaCha8Rng {
    fn roll_percent(&mut self) -> f32 {
        self.gen_range(0.0..100.0)
    }
}

/// Always rolls the same value. Handy for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub f32);

impl ChanceRoll for FixedRoll {
    fn roll_percent(&mut self) -> f32 {
        self.0
    }
}

/// How the damage that produced the event was delivered
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTraits {
    pub damage_type: DamageType,
    /// Damage over time (burning, bleeding)
    pub dot: bool,
    /// Thrown weapon or thrown body
    pub thrown: bool,
}

/// Everything an evaluation reads
#[derive(Debug, Clone, Copy)]
pub struct ArbitrationContext<'a> {
    pub config: &'a KillcamConfig,
    pub cooldowns: &'a CooldownRegistry,
    pub session_state: EffectState,
    pub active_kind: Option<TriggerKind>,
    pub traits: EventTraits,
    pub now: Timestamp,
}

/// Evaluate one kind. First failing check wins.
pub fn evaluate(kind: TriggerKind, ctx: &ArbitrationContext<'_>, roller: &mut dyn ChanceRoll) -> TriggerResult {
    if !ctx.now.is_finite() {
        return TriggerResult::Error;
    }

    if !ctx.config.enabled {
        return TriggerResult::ModDisabled;
    }

    let damage = &ctx.config.damage;
    if ctx.traits.dot && !damage.dot_enabled() {
        return TriggerResult::DamageTypeDisabled;
    }
    if !damage.type_enabled(ctx.traits.damage_type) {
        return TriggerResult::DamageTypeDisabled;
    }
    if ctx.traits.thrown && !damage.thrown_enabled() {
        return TriggerResult::ThrownWeaponDisabled;
    }

    let settings = ctx.config.trigger(kind);
    if !settings.enabled || !settings.is_usable() {
        return TriggerResult::TriggerDisabled;
    }

    match ctx.session_state {
        EffectState::Triggered | EffectState::Active => {
            let outranks = ctx.active_kind.map_or(true, |active| kind.outranks(&active));
            if !outranks {
                return TriggerResult::AlreadyActive;
            }
        }
        EffectState::EasingOut => return TriggerResult::EasingOut,
        EffectState::Idle => {}
    }

    if !ctx.cooldowns.global_ready(ctx.now) {
        return TriggerResult::GlobalCooldown;
    }
    if !ctx.cooldowns.kind_ready(kind, ctx.now) {
        return TriggerResult::TriggerCooldown;
    }

    if settings.chance < 100.0 {
        let roll = roller.roll_percent();
        if !roll.is_finite() {
            return TriggerResult::Error;
        }
        if roll >= settings.chance {
            return TriggerResult::ChanceFailed;
        }
    }

    TriggerResult::Success
}

/// Outcome of scanning a candidate set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arbitration {
    pub fired: Option<TriggerKind>,
    /// Every evaluated candidate, in evaluation order
    pub evaluated: Vec<(TriggerKind, TriggerResult)>,
}

impl Arbitration {
    /// Result for the last candidate evaluated, or `None` for an empty set
    pub fn final_result(&self) -> Option<TriggerResult> {
        self.evaluated.last().map(|(_, result)| *result)
    }
}

/// Scan candidates highest priority first and stop at the first success
pub fn arbitrate(
    candidates: &[TriggerKind],
    ctx: &ArbitrationContext<'_>,
    roller: &mut dyn ChanceRoll,
) -> Arbitration {
    let mut arbitration = Arbitration::default();

    for kind in by_priority_desc(candidates) {
        let result = evaluate(kind, ctx, roller);
        arbitration.evaluated.push((kind, result));

        if result.is_success() {
            arbitration.fired = Some(kind);
            break;
        }

        tracing::debug!("Trigger {:?} rejected: {}", kind, result.describe());
    }

    arbitration
}
