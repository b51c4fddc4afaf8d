use thiserror::Error;

use crate::world::HostFault;

#[derive(Error, Debug)]
pub enum KillcamError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Host collaborator fault: {0}")]
    Host(#[from] HostFault),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KillcamError>;
