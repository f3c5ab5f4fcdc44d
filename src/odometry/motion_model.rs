//! Constant-velocity prior for scan-to-scan registration.

use crate::geometry::SE3;

/// Constant velocity motion model.
///
/// Predicts the next cloud-to-cloud increment as the increment observed
/// between the previous two clouds.
pub struct MotionModel {
    /// Last observed increment `T_prev_curr`.
    increment: Option<SE3>,
}

impl MotionModel {
    pub fn new() -> Self {
        Self { increment: None }
    }

    /// Record the increment just estimated.
    pub fn update(&mut self, increment: &SE3) {
        self.increment = Some(increment.clone());
    }

    /// Predicted increment for the next cloud (identity before any motion).
    pub fn predict(&self) -> SE3 {
        self.increment.clone().unwrap_or_else(SE3::identity)
    }

    pub fn reset(&mut self) {
        self.increment = None;
    }
}

impl Default for MotionModel {
    fn default() -> Self {
        Self::new()
    }
}
