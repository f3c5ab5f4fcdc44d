//! Mapper configuration.
//!
//! Loads from a single TOML file; every field falls back to its default when
//! omitted, so an empty file (or no file at all) yields the default mapper.
//!
//! ## Example TOML
//!
//! ```toml
//! voxel_resolution = 0.1     # occupancy voxel edge length
//! drain_period_secs = 0.25   # how often buffered clouds are folded in
//!
//! [odometry]
//! max_iterations = 30
//! max_correspondence_distance = 1.0
//! convergence_tolerance = 1e-6
//! subsample_stride = 1
//! ```

mod odometry;

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, Result};

pub use odometry::OdometryConfig;

/// Default voxel edge length.
pub const DEFAULT_VOXEL_RESOLUTION: f64 = 0.1;

/// Default period between drain cycles.
pub const DEFAULT_DRAIN_PERIOD_SECS: f64 = 0.25;

/// Top-level mapper configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Edge length of an occupancy voxel (world units).
    pub voxel_resolution: f64,

    /// Period of the drain cycle in seconds.
    pub drain_period_secs: f64,

    /// Scan-to-scan odometry settings.
    pub odometry: OdometryConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            voxel_resolution: DEFAULT_VOXEL_RESOLUTION,
            drain_period_secs: DEFAULT_DRAIN_PERIOD_SECS,
            odometry: OdometryConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the mapper cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.voxel_resolution.is_finite() && self.voxel_resolution > 0.0) {
            return Err(MapperError::InvalidConfig(format!(
                "voxel_resolution must be positive, got {}",
                self.voxel_resolution
            )));
        }
        if !(self.drain_period_secs.is_finite() && self.drain_period_secs > 0.0) {
            return Err(MapperError::InvalidConfig(format!(
                "drain_period_secs must be positive, got {}",
                self.drain_period_secs
            )));
        }
        // The drain ticker schedules against the monotonic clock
        let schedulable = Duration::try_from_secs_f64(self.drain_period_secs)
            .ok()
            .and_then(|period| Instant::now().checked_add(period))
            .is_some();
        if !schedulable {
            return Err(MapperError::InvalidConfig(format!(
                "drain_period_secs is too large, got {}",
                self.drain_period_secs
            )));
        }
        self.odometry.validate()
    }

    /// Drain period as a `Duration`. Saturates for periods `validate` rejects.
    pub fn drain_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.drain_period_secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapperConfig::default();
        assert_eq!(config.voxel_resolution, 0.1);
        assert_eq!(config.drain_period(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = MapperConfig::from_toml_str("").unwrap();
        assert_eq!(config, MapperConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = MapperConfig::from_toml_str(
            r#"
            voxel_resolution = 0.05

            [odometry]
            max_iterations = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.voxel_resolution, 0.05);
        assert_eq!(config.drain_period_secs, 0.25);
        assert_eq!(config.odometry.max_iterations, 10);
        assert_eq!(
            config.odometry.max_correspondence_distance,
            OdometryConfig::default().max_correspondence_distance
        );
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = MapperConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(MapperConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(matches!(
            MapperConfig::from_toml_str("voxel_resolution = 0.0"),
            Err(MapperError::InvalidConfig(_))
        ));
        assert!(matches!(
            MapperConfig::from_toml_str("drain_period_secs = -1.0"),
            Err(MapperError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_unschedulable_period() {
        let config = MapperConfig {
            drain_period_secs: 1e30,
            ..MapperConfig::default()
        };
        assert!(matches!(config.validate(), Err(MapperError::InvalidConfig(_))));
        assert_eq!(config.drain_period(), Duration::MAX);

        assert!(matches!(
            MapperConfig::from_toml_str("drain_period_secs = 1e30"),
            Err(MapperError::InvalidConfig(_))
        ));
        assert!(MapperConfig::from_toml_str("drain_period_secs = 3600.0").is_ok());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            MapperConfig::from_toml_str("voxel_resolution = \"fine\""),
            Err(MapperError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapper.toml");
        std::fs::write(&path, "drain_period_secs = 0.5\n").unwrap();

        let config = MapperConfig::from_file(&path).unwrap();
        assert_eq!(config.drain_period(), Duration::from_millis(500));

        assert!(matches!(
            MapperConfig::from_file(&dir.path().join("missing.toml")),
            Err(MapperError::Io(_))
        ));
    }
}
