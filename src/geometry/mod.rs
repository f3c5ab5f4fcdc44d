//! Geometry utilities: SE3 transforms, rigid point-set alignment.

pub mod align;
pub mod se3;

pub use align::{align_rigid, centroid};
pub use se3::{SE3, homogeneous, transform_cloud};
