//! SE3: 6-DOF rigid-body transformation (rotation + translation).
//!
//! Poses follow the `T_world_local` convention: applying a pose to a point
//! expressed in a cloud's local sensor frame yields the point in the world
//! frame, `p' = R * p + t`.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

/// Rigid-body transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Construct from a rotation matrix and translation.
    ///
    /// The matrix is assumed orthonormal; it is not re-orthogonalized.
    pub fn from_rt(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let rot3 = Rotation3::from_matrix_unchecked(rotation);
        Self {
            rotation: UnitQuaternion::from_rotation_matrix(&rot3),
            translation,
        }
    }

    /// Construct from quaternion (w, x, y, z) and translation.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let rotation =
            UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(qw, qx, qy, qz));
        Self {
            rotation,
            translation,
        }
    }

    /// Homogeneous 4x4 matrix `[R | t; 0 0 0 1]`.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        homogeneous(&self.rotation_matrix(), &self.translation)
    }

    /// Rotation as a 3x3 matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Inverse transformation: `[R^T | -R^T t]`.
    pub fn inverse(&self) -> Self {
        let rot_inv = self.rotation.inverse();
        Self {
            rotation: rot_inv,
            translation: -(rot_inv * self.translation),
        }
    }

    /// Compose two transforms: self ∘ other.
    pub fn compose(&self, other: &SE3) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Transform a single point: p' = R * p + t.
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Pose a fraction `alpha` of the way from `self` to `other`: slerp on the
    /// rotation, linear on the translation.
    pub fn interpolate(&self, other: &SE3, alpha: f64) -> Self {
        Self {
            rotation: self.rotation.slerp(&other.rotation, alpha),
            translation: self.translation.lerp(&other.translation, alpha),
        }
    }

    /// Transform multiple points.
    pub fn transform_points(&self, pts: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        pts.iter().map(|p| self.transform_point(p)).collect()
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Build `T = [R t; 0 1]` from a rotation matrix and translation.
#[rustfmt::skip]
pub fn homogeneous(r: &Matrix3<f64>, t: &Vector3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        r[(0, 0)], r[(0, 1)], r[(0, 2)], t.x,
        r[(1, 0)], r[(1, 1)], r[(1, 2)], t.y,
        r[(2, 0)], r[(2, 1)], r[(2, 2)], t.z,
        0.0,       0.0,       0.0,       1.0,
    )
}

/// Apply a homogeneous transform to every point of a cloud.
pub fn transform_cloud(tf: &Matrix4<f64>, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
    let r: Matrix3<f64> = tf.fixed_view::<3, 3>(0, 0).into_owned();
    let t: Vector3<f64> = tf.fixed_view::<3, 1>(0, 3).into_owned();
    points.iter().map(|p| r * p + t).collect()
}
