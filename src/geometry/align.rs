//! Closed-form rigid alignment of corresponding point sets.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

use super::SE3;

/// Compute the rigid transform `T` minimizing `sum ||T * src_i - dst_i||²`.
///
/// Algorithm:
/// 1. Compute centroids of both point sets
/// 2. Center the points
/// 3. Rotation from the SVD of the cross-covariance matrix
/// 4. Translation: t = c_dst - R * c_src
///
/// Returns `None` for fewer than 3 pairs, mismatched lengths or a failed SVD.
pub fn align_rigid(src: &[Vector3<f64>], dst: &[Vector3<f64>]) -> Option<SE3> {
    let n = src.len();
    if n < 3 || n != dst.len() {
        return None;
    }

    let centroid_src = centroid(src);
    let centroid_dst = centroid(dst);

    // H = sum((src_i - c_src) * (dst_i - c_dst)^T)
    let mut h = Matrix3::zeros();
    for (s, d) in src.iter().zip(dst.iter()) {
        h += (s - centroid_src) * (d - centroid_dst).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    // R = V * U^T
    let mut rotation_mat = v_t.transpose() * u.transpose();

    // Reflection: flip the axis of the smallest singular value
    if rotation_mat.determinant() < 0.0 {
        let mut v = v_t.transpose();
        for i in 0..3 {
            v[(i, 2)] = -v[(i, 2)];
        }
        rotation_mat = v * u.transpose();
    }

    let rotation =
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation_mat));
    let translation = centroid_dst - rotation * centroid_src;

    Some(SE3 {
        rotation,
        translation,
    })
}

/// Centroid of a set of 3D points (zero for an empty set).
pub fn centroid(points: &[Vector3<f64>]) -> Vector3<f64> {
    if points.is_empty() {
        return Vector3::zeros();
    }
    let sum: Vector3<f64> = points.iter().sum();
    sum / points.len() as f64
}
