//! Scan-to-scan ICP odometry.
//!
//! Each new cloud is registered against the previous one with point-to-point
//! ICP. The resulting increment `T_prev_curr` is composed onto the integrated
//! pose, so the integrated pose always maps the latest cloud into the frame of
//! the first cloud (the world frame).

use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::cloud::PointCloud;
use crate::config::OdometryConfig;
use crate::error::{MapperError, Result};
use crate::geometry::{SE3, align_rigid};

use super::motion_model::MotionModel;
use super::neighbors::NeighborGrid;
use super::PoseIntegrator;

/// Minimum correspondences needed for a rigid alignment.
const MIN_CORRESPONDENCES: usize = 3;

/// Point-to-point ICP odometry.
pub struct IcpOdometry {
    /// Set by `initialize`.
    config: Option<OdometryConfig>,

    /// Previous cloud, bucketed for correspondence search.
    reference: Option<NeighborGrid>,

    /// T_world_latest.
    integrated: SE3,

    /// Initial guess for the next registration.
    motion_model: MotionModel,
}

impl IcpOdometry {
    pub fn new() -> Self {
        Self {
            config: None,
            reference: None,
            integrated: SE3::identity(),
            motion_model: MotionModel::new(),
        }
    }

    /// Convenience constructor that initializes immediately.
    pub fn with_config(config: &OdometryConfig) -> Result<Self> {
        let mut odom = Self::new();
        odom.initialize(config)?;
        Ok(odom)
    }

    /// Estimate `T_prev_curr` for `points` against the reference grid.
    ///
    /// Returns `None` when there are too few correspondences to align.
    fn register(
        &self,
        points: &[Vector3<f64>],
        reference: &NeighborGrid,
        config: &OdometryConfig,
    ) -> Option<SE3> {
        let source: Vec<Vector3<f64>> = points
            .iter()
            .step_by(config.subsample_stride)
            .copied()
            .collect();

        let mut estimate = self.motion_model.predict();

        for iteration in 0..config.max_iterations {
            let mut src = Vec::with_capacity(source.len());
            let mut dst = Vec::with_capacity(source.len());

            for p in &source {
                let q = estimate.transform_point(p);
                if let Some((nearest, _)) = reference.nearest(&q) {
                    src.push(*p);
                    dst.push(nearest);
                }
            }

            if src.len() < MIN_CORRESPONDENCES {
                debug!(
                    "ICP iteration {}: only {} correspondences",
                    iteration,
                    src.len()
                );
                return None;
            }

            let next = align_rigid(&src, &dst)?;
            let step = next.compose(&estimate.inverse());
            estimate = next;

            if step.translation.norm() < config.convergence_tolerance
                && step.rotation.angle() < config.convergence_tolerance
            {
                debug!("ICP converged after {} iterations", iteration + 1);
                break;
            }
        }

        Some(estimate)
    }
}

impl Default for IcpOdometry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseIntegrator for IcpOdometry {
    fn initialize(&mut self, config: &OdometryConfig) -> Result<()> {
        config.validate()?;
        self.config = Some(config.clone());
        self.reference = None;
        self.integrated = SE3::identity();
        self.motion_model.reset();
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    fn update(&mut self, cloud: &PointCloud) -> Result<()> {
        let config = self.config.clone().ok_or(MapperError::NotInitialized)?;
        cloud.validate()?;

        if cloud.is_empty() {
            debug!("Empty cloud at {} ns; pose unchanged", cloud.timestamp_ns);
            return Ok(());
        }

        let increment = self
            .reference
            .as_ref()
            .map(|reference| self.register(&cloud.points, reference, &config));

        match increment {
            // First cloud defines the world frame
            None => {}
            Some(Some(increment)) => {
                self.integrated = self.integrated.compose(&increment);
                self.motion_model.update(&increment);
            }
            Some(None) => {
                debug!(
                    "Too few correspondences for cloud at {} ns; keeping previous pose",
                    cloud.timestamp_ns
                );
            }
        }

        self.reference = Some(NeighborGrid::new(
            cloud.points.clone(),
            config.max_correspondence_distance,
        ));
        Ok(())
    }

    fn integrated_rotation(&self) -> Matrix3<f64> {
        self.integrated.rotation_matrix()
    }

    fn integrated_translation(&self) -> Vector3<f64> {
        self.integrated.translation
    }
}
