//! Effect session state machine
//!
//! Idle -> Triggered -> Active -> EasingOut -> Idle. Every exit from Active,
//! natural or forced, goes through EasingOut so time scale always returns
//! to normal by interpolation. Only the fatal path snaps straight to Idle.

use serde::{Deserialize, Serialize};

use crate::core::types::{Timestamp, MIN_TIME_SCALE, NORMAL_TIME_SCALE};
use crate::trigger::TriggerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EffectState {
    #[default]
    Idle,
    Triggered,
    Active,
    EasingOut,
}

/// Resolved parameters for one effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectParams {
    pub time_scale: f32,
    pub duration: Timestamp,
    pub ease_out: Timestamp,
    /// Hand the camera to the kill target while active
    pub camera: bool,
}

/// Transitions reported to the owner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Activated { kind: TriggerKind, camera: bool },
    EasingOut { kind: TriggerKind, cancelled: bool },
    Ended { kind: TriggerKind },
    ForcedReset { kind: Option<TriggerKind> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectSession {
    state: EffectState,
    active_kind: Option<TriggerKind>,
    started_at: Timestamp,
    duration: Timestamp,
    ease_out_duration: Timestamp,
    /// Start of the current Active/EasingOut phase
    phase_started_at: Timestamp,
    target_scale: f32,
    /// Scale at the moment easing began
    ease_from: f32,
    camera: bool,
    /// Set by `cancel`: EasingOut must survive one full tick
    hold_frame: bool,
}

impl Default for EffectSession {
    fn default() -> Self {
        Self {
            state: EffectState::Idle,
            active_kind: None,
            started_at: 0.0,
            duration: 0.0,
            ease_out_duration: 0.0,
            phase_started_at: 0.0,
            target_scale: NORMAL_TIME_SCALE,
            ease_from: NORMAL_TIME_SCALE,
            camera: false,
            hold_frame: false,
        }
    }
}

impl EffectSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn active_kind(&self) -> Option<TriggerKind> {
        self.active_kind
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn is_idle(&self) -> bool {
        self.state == EffectState::Idle
    }

    pub fn wants_camera(&self) -> bool {
        self.camera && matches!(self.state, EffectState::Triggered | EffectState::Active)
    }

    /// Record a successful arbitration. Replaces a lower-priority running
    /// effect; refused while easing out.
    pub fn trigger(&mut self, kind: TriggerKind, params: EffectParams, now: Timestamp) -> bool {
        if self.state == EffectState::EasingOut {
            return false;
        }

        self.state = EffectState::Triggered;
        self.active_kind = Some(kind);
        self.started_at = now;
        self.phase_started_at = now;
        self.duration = params.duration.max(0.0);
        self.ease_out_duration = params.ease_out.max(0.0);
        self.target_scale = params.time_scale.clamp(MIN_TIME_SCALE, NORMAL_TIME_SCALE);
        self.ease_from = self.target_scale;
        self.camera = params.camera;
        self.hold_frame = false;
        true
    }

    /// Triggered -> Active. Time scale takes effect from here.
    pub fn activate(&mut self, now: Timestamp) -> Option<SessionEvent> {
        if self.state != EffectState::Triggered {
            return None;
        }
        let kind = self.active_kind?;

        self.state = EffectState::Active;
        self.phase_started_at = now;
        Some(SessionEvent::Activated { kind, camera: self.camera })
    }

    /// Trigger and activate in one step
    pub fn fire(&mut self, kind: TriggerKind, params: EffectParams, now: Timestamp) -> Option<SessionEvent> {
        if !self.trigger(kind, params, now) {
            return None;
        }
        self.activate(now)
    }

    /// Forced early exit (player death, runtime disable). Routes through
    /// EasingOut and holds there for at least one tick.
    pub fn cancel(&mut self, now: Timestamp) -> Option<SessionEvent> {
        match self.state {
            EffectState::Triggered | EffectState::Active => {
                let kind = self.active_kind?;
                self.ease_from = self.time_scale_at(now);
                self.begin_ease_out(now);
                self.hold_frame = true;
                Some(SessionEvent::EasingOut { kind, cancelled: true })
            }
            EffectState::Idle | EffectState::EasingOut => None,
        }
    }

    /// Snap to Idle with no easing. Fatal path only.
    pub fn force_reset(&mut self) -> Option<SessionEvent> {
        if self.state == EffectState::Idle {
            return None;
        }
        let kind = self.active_kind;
        *self = Self::default();
        Some(SessionEvent::ForcedReset { kind })
    }

    /// Advance timers and process every transition that is due
    pub fn tick(&mut self, now: Timestamp) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        loop {
            match self.state {
                EffectState::Idle => break,
                EffectState::Triggered => match self.activate(now) {
                    Some(event) => events.push(event),
                    None => break,
                },
                EffectState::Active => {
                    let expires_at = self.phase_started_at + self.duration;
                    if now < expires_at {
                        break;
                    }
                    let Some(kind) = self.active_kind else { break };
                    self.ease_from = self.target_scale;
                    self.begin_ease_out(expires_at);
                    events.push(SessionEvent::EasingOut { kind, cancelled: false });
                }
                EffectState::EasingOut => {
                    if self.hold_frame {
                        self.hold_frame = false;
                        break;
                    }
                    if now < self.phase_started_at + self.ease_out_duration {
                        break;
                    }
                    let Some(kind) = self.active_kind else { break };
                    *self = Self::default();
                    events.push(SessionEvent::Ended { kind });
                }
            }
        }

        events
    }

    /// Time scale this session wants applied at `now`
    pub fn time_scale_at(&self, now: Timestamp) -> f32 {
        match self.state {
            EffectState::Idle => NORMAL_TIME_SCALE,
            EffectState::Triggered | EffectState::Active => self.target_scale,
            EffectState::EasingOut => {
                let fraction = if self.ease_out_duration <= 0.0 {
                    1.0
                } else {
                    ((now - self.phase_started_at) / self.ease_out_duration).clamp(0.0, 1.0) as f32
                };
                self.ease_from + (NORMAL_TIME_SCALE - self.ease_from) * fraction
            }
        }
    }

    fn begin_ease_out(&mut self, at: Timestamp) {
        self.state = EffectState::EasingOut;
        self.phase_started_at = at;
    }
}
