//! Scan-to-scan odometry configuration section.

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, Result};

/// Configuration for ICP odometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometryConfig {
    /// Maximum ICP iterations per cloud.
    pub max_iterations: usize,

    /// Correspondences farther apart than this are rejected.
    pub max_correspondence_distance: f64,

    /// Stop iterating once the incremental update moves less than this.
    pub convergence_tolerance: f64,

    /// Use every n-th source point when searching correspondences.
    pub subsample_stride: usize,
}

impl Default for OdometryConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            max_correspondence_distance: 1.0,
            convergence_tolerance: 1e-6,
            subsample_stride: 1,
        }
    }
}

impl OdometryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(MapperError::InvalidConfig(
                "odometry.max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.max_correspondence_distance.is_finite() && self.max_correspondence_distance > 0.0)
        {
            return Err(MapperError::InvalidConfig(format!(
                "odometry.max_correspondence_distance must be positive, got {}",
                self.max_correspondence_distance
            )));
        }
        if !(self.convergence_tolerance.is_finite() && self.convergence_tolerance >= 0.0) {
            return Err(MapperError::InvalidConfig(format!(
                "odometry.convergence_tolerance must be non-negative, got {}",
                self.convergence_tolerance
            )));
        }
        if self.subsample_stride == 0 {
            return Err(MapperError::InvalidConfig(
                "odometry.subsample_stride must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
