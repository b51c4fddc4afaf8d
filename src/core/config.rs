//! Killcam configuration with documented defaults
//!
//! The director holds one immutable snapshot of this struct. Hosts build it
//! from a TOML file (`load_config`) or in code, and may swap the snapshot
//! between frames.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{KillcamError, Result};
use crate::core::types::{DamageType, Timestamp, MIN_TIME_SCALE, NORMAL_TIME_SCALE};
use crate::trigger::TriggerKind;

/// Tuning presets. Anything but `Custom` overrides the per-trigger numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Subtle,
    #[default]
    Balanced,
    Cinematic,
    Custom,
}

/// Per-trigger effect parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSettings {
    /// Trigger toggle, honoured in every preset
    pub enabled: bool,
    /// Chance to fire, in percent (0-100)
    pub chance: f32,
    /// Slow-motion time scale while active (0.05-1.0)
    pub time_scale: f32,
    /// Seconds at full strength
    pub duration: Timestamp,
    /// Seconds spent easing back to normal speed
    pub ease_out: Timestamp,
    /// Seconds before this kind may fire again, counted from effect end
    pub cooldown: Timestamp,
    /// Whether this kind hands the camera to the kill target
    pub camera: bool,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 100.0,
            time_scale: 0.2,
            duration: 1.5,
            ease_out: 0.5,
            cooldown: 0.0,
            camera: false,
        }
    }
}

impl TriggerSettings {
    fn with(chance: f32, time_scale: f32, duration: Timestamp, cooldown: Timestamp, smoothing: f32, camera: bool) -> Self {
        Self {
            enabled: true,
            chance,
            time_scale,
            duration,
            ease_out: ease_out_for_smoothing(smoothing),
            cooldown,
            camera,
        }
    }

    /// Defaults used by the `Custom` preset when a table is omitted
    pub fn defaults_for(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::BasicKill => Self::with(15.0, 0.3, 1.0, 0.0, 8.0, false),
            TriggerKind::Dismemberment => Self::with(80.0, 0.2, 1.5, 0.0, 8.0, false),
            TriggerKind::Critical => Self::with(100.0, 0.2, 1.5, 0.0, 8.0, false),
            TriggerKind::Headshot => Self::with(100.0, 0.2, 1.5, 0.0, 8.0, true),
            TriggerKind::Parry => Self::with(50.0, 0.25, 1.0, 0.0, 8.0, false),
            TriggerKind::Decapitation => Self::with(100.0, 0.15, 2.0, 0.0, 8.0, true),
            TriggerKind::LastEnemy => Self::with(100.0, 0.15, 2.5, 0.0, 8.0, true),
            TriggerKind::LastStand => Self::with(100.0, 0.1, 5.0, 0.0, 8.0, false),
        }
    }

    /// Hardcoded preset numbers, tailored per kind. `None` for `Custom`.
    pub fn from_preset(preset: Preset, kind: TriggerKind) -> Option<Self> {
        use Preset::*;
        use TriggerKind::*;
        let settings = match (kind, preset) {
            (_, Custom) => return None,

            // Basic kills are common - keep subtle
            (BasicKill, Subtle) => Self::with(15.0, 0.5, 0.5, 10.0, 12.0, false),
            (BasicKill, Balanced) => Self::with(25.0, 0.35, 1.0, 5.0, 8.0, false),
            (BasicKill, Cinematic) => Self::with(40.0, 0.25, 1.5, 3.0, 4.0, false),

            (Critical, Subtle) => Self::with(50.0, 0.4, 1.0, 8.0, 12.0, false),
            (Critical, Balanced) => Self::with(75.0, 0.25, 1.5, 5.0, 8.0, false),
            (Critical, Cinematic) => Self::with(100.0, 0.15, 2.5, 3.0, 4.0, true),

            (Headshot, Subtle) => Self::with(60.0, 0.4, 1.0, 8.0, 12.0, false),
            (Headshot, Balanced) => Self::with(80.0, 0.25, 1.75, 5.0, 8.0, true),
            (Headshot, Cinematic) => Self::with(100.0, 0.15, 2.5, 3.0, 4.0, true),

            (Dismemberment, Subtle) => Self::with(40.0, 0.45, 1.0, 8.0, 12.0, false),
            (Dismemberment, Balanced) => Self::with(60.0, 0.3, 1.5, 5.0, 8.0, false),
            (Dismemberment, Cinematic) => Self::with(85.0, 0.2, 2.5, 3.0, 4.0, false),

            // Rare and epic
            (Decapitation, Subtle) => Self::with(70.0, 0.35, 1.5, 5.0, 8.0, false),
            (Decapitation, Balanced) => Self::with(90.0, 0.2, 2.0, 4.0, 6.0, true),
            (Decapitation, Cinematic) => Self::with(100.0, 0.1, 3.5, 2.0, 4.0, true),

            // Parries need a quick response
            (Parry, Subtle) => Self::with(30.0, 0.45, 0.8, 10.0, 12.0, false),
            (Parry, Balanced) => Self::with(50.0, 0.3, 1.2, 7.0, 10.0, false),
            (Parry, Cinematic) => Self::with(75.0, 0.2, 1.8, 5.0, 8.0, false),

            (LastEnemy, Subtle) => Self::with(80.0, 0.35, 2.0, 0.0, 6.0, false),
            (LastEnemy, Balanced) => Self::with(100.0, 0.2, 3.0, 0.0, 4.0, true),
            (LastEnemy, Cinematic) => Self::with(100.0, 0.1, 5.0, 0.0, 2.0, true),

            // Always fires once the health threshold is crossed
            (LastStand, Subtle) => Self::with(100.0, 0.25, 3.0, 60.0, 4.0, false),
            (LastStand, Balanced) => Self::with(100.0, 0.15, 5.0, 45.0, 4.0, false),
            (LastStand, Cinematic) => Self::with(100.0, 0.1, 8.0, 30.0, 2.0, false),
        };
        Some(settings)
    }

    /// Malformed numbers make the trigger unusable rather than an error
    pub fn is_usable(&self) -> bool {
        let finite = self.chance.is_finite()
            && self.time_scale.is_finite()
            && self.duration.is_finite()
            && self.ease_out.is_finite()
            && self.cooldown.is_finite();

        finite
            && (0.0..=100.0).contains(&self.chance)
            && self.time_scale > 0.0
            && self.time_scale <= NORMAL_TIME_SCALE
            && self.duration >= 0.0
            && self.ease_out >= 0.0
            && self.cooldown >= 0.0
    }

    /// Time scale clamped into the range the engine will apply
    pub fn clamped_time_scale(&self) -> f32 {
        self.time_scale.clamp(MIN_TIME_SCALE, NORMAL_TIME_SCALE)
    }
}

/// Convert a lerp smoothing speed into an explicit ease-out window.
///
/// Exit transitions ran at half the entry speed; a half-speed exponential lerp
/// settles in roughly `4 / smoothing` seconds.
fn ease_out_for_smoothing(smoothing: f32) -> Timestamp {
    if smoothing <= 0.0 {
        0.0
    } else {
        (4.0 / smoothing) as Timestamp
    }
}

/// Per-trigger tables for the `Custom` preset and enable flags for all presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggersConfig {
    pub basic_kill: TriggerSettings,
    pub dismemberment: TriggerSettings,
    pub critical: TriggerSettings,
    pub headshot: TriggerSettings,
    pub parry: TriggerSettings,
    pub decapitation: TriggerSettings,
    pub last_enemy: TriggerSettings,
    pub last_stand: TriggerSettings,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            basic_kill: TriggerSettings::defaults_for(TriggerKind::BasicKill),
            dismemberment: TriggerSettings::defaults_for(TriggerKind::Dismemberment),
            critical: TriggerSettings::defaults_for(TriggerKind::Critical),
            headshot: TriggerSettings::defaults_for(TriggerKind::Headshot),
            parry: TriggerSettings::defaults_for(TriggerKind::Parry),
            decapitation: TriggerSettings::defaults_for(TriggerKind::Decapitation),
            last_enemy: TriggerSettings::defaults_for(TriggerKind::LastEnemy),
            last_stand: TriggerSettings::defaults_for(TriggerKind::LastStand),
        }
    }
}

impl TriggersConfig {
    pub fn get(&self, kind: TriggerKind) -> &TriggerSettings {
        match kind {
            TriggerKind::BasicKill => &self.basic_kill,
            TriggerKind::Dismemberment => &self.dismemberment,
            TriggerKind::Critical => &self.critical,
            TriggerKind::Headshot => &self.headshot,
            TriggerKind::Parry => &self.parry,
            TriggerKind::Decapitation => &self.decapitation,
            TriggerKind::LastEnemy => &self.last_enemy,
            TriggerKind::LastStand => &self.last_stand,
        }
    }

    pub fn get_mut(&mut self, kind: TriggerKind) -> &mut TriggerSettings {
        match kind {
            TriggerKind::BasicKill => &mut self.basic_kill,
            TriggerKind::Dismemberment => &mut self.dismemberment,
            TriggerKind::Critical => &mut self.critical,
            TriggerKind::Headshot => &mut self.headshot,
            TriggerKind::Parry => &mut self.parry,
            TriggerKind::Decapitation => &mut self.decapitation,
            TriggerKind::LastEnemy => &mut self.last_enemy,
            TriggerKind::LastStand => &mut self.last_stand,
        }
    }
}

/// Damage-type multipliers. A multiplier of 0.0 disables that damage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    pub unknown: f32,
    pub slash: f32,
    pub pierce: f32,
    pub blunt: f32,
    pub energy: f32,
    pub fire: f32,
    pub lightning: f32,
    /// Damage-over-time kills (burning, bleeding)
    pub dot: f32,
    /// Kills by thrown weapons and thrown bodies
    pub thrown: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            unknown: 1.0,
            slash: 1.0,
            pierce: 1.0,
            blunt: 1.0,
            energy: 1.0,
            fire: 1.0,
            lightning: 1.0,
            dot: 0.0,
            thrown: 1.0,
        }
    }
}

impl DamageConfig {
    pub fn multiplier(&self, damage_type: DamageType) -> f32 {
        match damage_type {
            DamageType::Unknown => self.unknown,
            DamageType::Slash => self.slash,
            DamageType::Pierce => self.pierce,
            DamageType::Blunt => self.blunt,
            DamageType::Energy => self.energy,
            DamageType::Fire => self.fire,
            DamageType::Lightning => self.lightning,
        }
    }

    pub fn type_enabled(&self, damage_type: DamageType) -> bool {
        self.multiplier(damage_type) > 0.0
    }

    pub fn dot_enabled(&self) -> bool {
        self.dot > 0.0
    }

    pub fn thrown_enabled(&self) -> bool {
        self.thrown > 0.0
    }
}

/// Ride-cam and follow-cam tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Follow projectiles from launch (experimental)
    pub ride_cam_enabled: bool,
    /// Arm on launch instead of waiting for a confirmed kill
    pub predictive_aiming: bool,
    /// Chance in percent that a launch arms the ride cam
    pub ride_cam_chance: f32,
    /// Forward raycast reach used to guess the likely target
    pub raycast_range: f32,
    /// Frames to wait in PredictiveArmed for a projectile to bind
    pub predictive_arm_frames: u32,
    /// Frames to poll for a ragdoll entry after impact
    pub ragdoll_poll_frames: u32,
    /// Seconds the camera may follow a ragdoll before returning
    pub ragdoll_track_duration: Timestamp,
    /// Seconds to blend back to first person
    pub return_blend_duration: Timestamp,
    /// Show the player body while the camera is detached
    pub show_player_body: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ride_cam_enabled: false,
            predictive_aiming: true,
            ride_cam_chance: 25.0,
            raycast_range: 100.0,
            predictive_arm_frames: 30,
            ragdoll_poll_frames: 20,
            ragdoll_track_duration: 5.0,
            return_blend_duration: 0.125,
            show_player_body: true,
        }
    }
}

/// Complete killcam configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillcamConfig {
    /// Master switch
    pub enabled: bool,
    pub preset: Preset,
    /// Seed for the probability rolls
    pub seed: u64,
    /// Seconds after any effect before another may start
    pub global_cooldown: Timestamp,
    /// Harder hits slow time further (up to 30% of the remaining headroom)
    pub dynamic_intensity: bool,
    /// Player health ratio at or below which Last Stand fires
    pub last_stand_health_threshold: f32,
    /// Seconds after a player throw during which an impact kill counts as thrown
    pub thrown_impact_window: Timestamp,
    /// Seconds a kill is remembered to dedup the death-event fallback
    pub kill_dedup_window: Timestamp,
    /// Cooldown entries older than this are dropped by the frame pump
    pub cooldown_retention: Timestamp,
    pub damage: DamageConfig,
    pub camera: CameraConfig,
    pub triggers: TriggersConfig,
}

impl Default for KillcamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preset: Preset::Balanced,
            seed: 0x5EED,
            global_cooldown: 0.0,
            dynamic_intensity: false,
            last_stand_health_threshold: 0.15,
            thrown_impact_window: 1.5,
            kill_dedup_window: 1.0,
            cooldown_retention: 120.0,
            damage: DamageConfig::default(),
            camera: CameraConfig::default(),
            triggers: TriggersConfig::default(),
        }
    }
}

impl KillcamConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective settings for a kind: preset numbers with the table's enable flag
    pub fn trigger(&self, kind: TriggerKind) -> TriggerSettings {
        let table = self.triggers.get(kind);
        match TriggerSettings::from_preset(self.preset, kind) {
            Some(mut preset) => {
                preset.enabled = table.enabled;
                preset
            }
            None => table.clone(),
        }
    }

    /// Validate configuration for internal consistency
    ///
    /// Malformed per-trigger tables are not errors: those triggers simply
    /// never fire.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.global_cooldown.is_finite() || self.global_cooldown < 0.0 {
            return Err(format!(
                "global_cooldown ({}) must be a non-negative number of seconds",
                self.global_cooldown
            ));
        }

        if !(self.last_stand_health_threshold > 0.0 && self.last_stand_health_threshold < 1.0) {
            return Err(format!(
                "last_stand_health_threshold ({}) must be between 0 and 1",
                self.last_stand_health_threshold
            ));
        }

        for (name, value) in [
            ("thrown_impact_window", self.thrown_impact_window),
            ("kill_dedup_window", self.kill_dedup_window),
            ("cooldown_retention", self.cooldown_retention),
            ("camera.ragdoll_track_duration", self.camera.ragdoll_track_duration),
            ("camera.return_blend_duration", self.camera.return_blend_duration),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} ({}) must be a non-negative number of seconds", name, value));
            }
        }

        if !(0.0..=100.0).contains(&self.camera.ride_cam_chance) {
            return Err(format!(
                "camera.ride_cam_chance ({}) must be a percentage",
                self.camera.ride_cam_chance
            ));
        }

        let multipliers = DamageType::ALL
            .iter()
            .map(|t| self.damage.multiplier(*t))
            .chain([self.damage.dot, self.damage.thrown]);
        for multiplier in multipliers {
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err("Damage multipliers must be non-negative".into());
            }
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: KillcamConfig = toml::from_str(content)?;
        config.validate().map_err(KillcamError::InvalidConfig)?;

        for kind in TriggerKind::ALL {
            if !config.trigger(kind).is_usable() {
                tracing::warn!("Trigger {:?} has unusable settings and will never fire", kind);
            }
        }

        Ok(config)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<KillcamConfig> {
    let contents = fs::read_to_string(path)?;
    KillcamConfig::from_toml_str(&contents)
}
