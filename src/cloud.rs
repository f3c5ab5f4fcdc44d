//! Timestamped point cloud as delivered by a range sensor.

use nalgebra::Vector3;

use crate::error::{MapperError, Result};

/// A single sensor sweep in the sensor's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    /// Acquisition time in nanoseconds.
    pub timestamp_ns: u64,

    /// Points in the local sensor frame, in sensor order.
    pub points: Vec<Vector3<f64>>,
}

impl PointCloud {
    pub fn new(timestamp_ns: u64, points: Vec<Vector3<f64>>) -> Self {
        Self {
            timestamp_ns,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reject clouds containing NaN or infinite coordinates.
    pub fn validate(&self) -> Result<()> {
        match self.points.iter().position(|p| !is_finite(p)) {
            Some(index) => Err(MapperError::MalformedPoint {
                timestamp_ns: self.timestamp_ns,
                index,
            }),
            None => Ok(()),
        }
    }
}

/// True when all three coordinates are finite.
#[inline]
pub fn is_finite(p: &Vector3<f64>) -> bool {
    p.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_finite_cloud() {
        let cloud = PointCloud::new(5, vec![Vector3::new(1.0, 2.0, 3.0), Vector3::zeros()]);
        assert!(cloud.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_bad_index() {
        let cloud = PointCloud::new(
            9,
            vec![
                Vector3::zeros(),
                Vector3::new(f64::NAN, 0.0, 0.0),
                Vector3::new(0.0, f64::INFINITY, 0.0),
            ],
        );

        match cloud.validate() {
            Err(MapperError::MalformedPoint {
                timestamp_ns,
                index,
            }) => {
                assert_eq!(timestamp_ns, 9);
                assert_eq!(index, 1);
            }
            other => panic!("expected MalformedPoint, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_cloud_is_valid() {
        let cloud = PointCloud::new(0, Vec::new());
        assert!(cloud.is_empty());
        assert!(cloud.validate().is_ok());
    }
}
