//! Killcam - cinematic slow-motion and ride-cam director for game mods
//!
//! Hook points feed gameplay events into a [`director::Director`], which
//! arbitrates at most one cinematic effect at a time and drives time scale,
//! camera and weapon blocking through an [`world::EffectSink`].

pub mod camera;
pub mod core;
pub mod director;
pub mod effect;
pub mod replay;
pub mod trigger;
pub mod world;

pub use crate::core::config::{KillcamConfig, Preset};
pub use crate::core::error::{KillcamError, Result};
pub use crate::core::types::{EntityId, ProjectileHandle, Timestamp, TransformHandle};
pub use crate::director::Director;
