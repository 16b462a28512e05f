/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/// Every failure the engine, its coordinator and the driver can report.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("origin and destination are both floor {0}")]
    SameFloor(u8),

    #[error("floor {floor} is outside the configured range 0..{n_floors}")]
    FloorOutOfRange { floor: u8, n_floors: u8 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scenario '{0}' not found")]
    UnknownScenario(String),

    #[error("simulation thread is no longer running")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize system state: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
