//! Trigger kinds and their fixed priority table

use serde::{Deserialize, Serialize};

/// Cinematic-worthy event categories
///
/// Priorities are spaced so new kinds can slot in between without
/// renumbering. Higher value wins ties and may interrupt an active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    BasicKill,
    Dismemberment,
    Critical,
    Headshot,
    Parry,
    Decapitation,
    LastEnemy,
    LastStand,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 8] = [
        TriggerKind::BasicKill,
        TriggerKind::Dismemberment,
        TriggerKind::Critical,
        TriggerKind::Headshot,
        TriggerKind::Parry,
        TriggerKind::Decapitation,
        TriggerKind::LastEnemy,
        TriggerKind::LastStand,
    ];

    pub fn priority(&self) -> u8 {
        match self {
            TriggerKind::BasicKill => 10,
            TriggerKind::Dismemberment => 20,
            TriggerKind::Critical => 30,
            TriggerKind::Headshot => 35,
            TriggerKind::Parry => 40,
            TriggerKind::Decapitation => 50,
            TriggerKind::LastEnemy => 60,
            TriggerKind::LastStand => 100,
        }
    }

    /// Returns true if this kind strictly outranks the other
    pub fn outranks(&self, other: &TriggerKind) -> bool {
        self.priority() > other.priority()
    }

    /// Banner text logged when an effect of this kind starts
    pub fn display_name(&self) -> &'static str {
        match self {
            TriggerKind::BasicKill => "KILL",
            TriggerKind::Dismemberment => "DISMEMBER!",
            TriggerKind::Critical => "CRITICAL!",
            TriggerKind::Headshot => "HEADSHOT!",
            TriggerKind::Parry => "PARRY!",
            TriggerKind::Decapitation => "DECAPITATION!",
            TriggerKind::LastEnemy => "LAST ENEMY!",
            TriggerKind::LastStand => "LAST STAND!",
        }
    }

    /// Config table key, e.g. `last_enemy`
    pub fn key(&self) -> &'static str {
        match self {
            TriggerKind::BasicKill => "basic_kill",
            TriggerKind::Dismemberment => "dismemberment",
            TriggerKind::Critical => "critical",
            TriggerKind::Headshot => "headshot",
            TriggerKind::Parry => "parry",
            TriggerKind::Decapitation => "decapitation",
            TriggerKind::LastEnemy => "last_enemy",
            TriggerKind::LastStand => "last_stand",
        }
    }
}

/// Sort candidates highest priority first, dropping duplicates
pub fn by_priority_desc(candidates: &[TriggerKind]) -> Vec<TriggerKind> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.priority()));
    sorted.dedup();
    sorted
}
