//! Error types for the mapper.
//!
//! Setup faults (`NotInitialized`, `InvalidConfig`, `Io`, `Parse`) are fatal and
//! surface from constructors. Per-cloud faults are reported by the drain loop,
//! which skips the offending cloud and carries on.

use thiserror::Error;

/// Mapper error type
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("pose integrator has not been initialized")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("cloud at {timestamp_ns} ns has an unmappable point at index {index}")]
    MalformedPoint { timestamp_ns: u64, index: usize },

    #[error("trajectory has no pose left for cloud at {timestamp_ns} ns")]
    TrajectoryExhausted { timestamp_ns: u64 },

    #[error("no trajectory pose close enough to cloud at {timestamp_ns} ns")]
    PoseUnavailable { timestamp_ns: u64 },

    #[error("odometry failed: {0}")]
    Odometry(String),
}

impl MapperError {
    /// Whether this error only affects a single cloud (skip and continue).
    pub fn is_per_cloud(&self) -> bool {
        matches!(
            self,
            MapperError::MalformedPoint { .. }
                | MapperError::TrajectoryExhausted { .. }
                | MapperError::PoseUnavailable { .. }
                | MapperError::Odometry(_)
        )
    }
}

impl From<toml::de::Error> for MapperError {
    fn from(e: toml::de::Error) -> Self {
        MapperError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
