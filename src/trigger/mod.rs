//! Trigger arbitration - decides which single cinematic effect fires
//!
//! Candidates come from classified gameplay events. Each is checked against
//! enable flags, damage rules, the running effect, cooldowns and a chance
//! roll, highest priority first.

pub mod arbiter;
pub mod cooldown;
pub mod kind;
pub mod result;

pub use arbiter::{arbitrate, evaluate, Arbitration, ArbitrationContext, ChanceRoll, EventTraits, FixedRoll};
pub use cooldown::CooldownRegistry;
pub use kind::{by_priority_desc, TriggerKind};
pub use result::TriggerResult;
