//! Event intake and frame pump
//!
//! Host hooks push events into the `Director`; once per frame
//! `on_frame_update` advances cooldowns, the effect session and the camera,
//! then reconciles shared world state.

pub mod classify;
pub mod engine;
pub mod events;
pub mod reconcile;
pub mod stats;
pub mod throws;

pub use engine::{Director, FrameReport, HIT_MEMORY};
pub use events::{DamageEvent, HitRecord, KillCause, ProjectileShot};
pub use reconcile::{DesiredState, ReconcileOutcome, Reconciler};
pub use stats::DirectorStats;
pub use throws::ThrowTracker;
