//! Outcome of a single arbitration call

use serde::{Deserialize, Serialize};

/// Why a trigger did or did not fire. Exactly one per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerResult {
    Success,
    ModDisabled,
    DamageTypeDisabled,
    ThrownWeaponDisabled,
    TriggerDisabled,
    GlobalCooldown,
    TriggerCooldown,
    AlreadyActive,
    EasingOut,
    ChanceFailed,
    Error,
}

impl TriggerResult {
    pub const ALL: [TriggerResult; 11] = [
        TriggerResult::Success,
        TriggerResult::ModDisabled,
        TriggerResult::DamageTypeDisabled,
        TriggerResult::ThrownWeaponDisabled,
        TriggerResult::TriggerDisabled,
        TriggerResult::GlobalCooldown,
        TriggerResult::TriggerCooldown,
        TriggerResult::AlreadyActive,
        TriggerResult::EasingOut,
        TriggerResult::ChanceFailed,
        TriggerResult::Error,
    ];

    pub fn is_success(&self) -> bool {
        matches!(self, TriggerResult::Success)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TriggerResult::Success => "fired",
            TriggerResult::ModDisabled => "mod disabled",
            TriggerResult::DamageTypeDisabled => "damage type disabled",
            TriggerResult::ThrownWeaponDisabled => "thrown weapon kills disabled",
            TriggerResult::TriggerDisabled => "trigger disabled",
            TriggerResult::GlobalCooldown => "global cooldown",
            TriggerResult::TriggerCooldown => "trigger cooldown",
            TriggerResult::AlreadyActive => "equal or higher priority effect active",
            TriggerResult::EasingOut => "effect easing out",
            TriggerResult::ChanceFailed => "chance roll failed",
            TriggerResult::Error => "evaluation error",
        }
    }
}
