//! Pose integration: the running transform from each new cloud's local frame
//! to the world frame.
//!
//! The map builder only depends on the [`PoseIntegrator`] trait. Two
//! integrators are provided:
//! - [`IcpOdometry`] - scan-to-scan point-to-point ICP
//! - [`TrajectoryPlayback`] - replays a recorded trajectory, by timestamp or
//!   in order

pub mod icp;
pub mod motion_model;
pub mod neighbors;
pub mod playback;

use nalgebra::{Matrix3, Vector3};

use crate::cloud::PointCloud;
use crate::config::OdometryConfig;
use crate::error::Result;
use crate::geometry::SE3;

pub use icp::IcpOdometry;
pub use motion_model::MotionModel;
pub use playback::{TrajectoryEntry, TrajectoryPlayback};

/// Running rigid-body pose estimate driven by incoming clouds.
///
/// The map builder calls [`update`](PoseIntegrator::update) once per cloud in
/// timestamp order and reads the pose right after, so the integrated pose
/// must already include the cloud just passed in.
pub trait PoseIntegrator: Send {
    /// Prepare the integrator. Must succeed before the integrator is handed
    /// to a map builder.
    fn initialize(&mut self, config: &OdometryConfig) -> Result<()>;

    fn is_initialized(&self) -> bool;

    /// Fold one cloud into the integrated pose.
    fn update(&mut self, cloud: &PointCloud) -> Result<()>;

    /// Rotation from the latest cloud's frame to the world frame.
    fn integrated_rotation(&self) -> Matrix3<f64>;

    /// Translation from the latest cloud's frame to the world frame.
    fn integrated_translation(&self) -> Vector3<f64>;

    /// Integrated pose as an SE3.
    fn integrated_pose(&self) -> SE3 {
        SE3::from_rt(self.integrated_rotation(), self.integrated_translation())
    }
}
