pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, KillcamConfig, Preset, TriggerSettings};
pub use error::{KillcamError, Result};
