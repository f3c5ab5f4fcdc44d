//! SpatialIndex - voxel occupancy index over [`PointMap`] storage.
//!
//! The index does not own any point data. For each occupied voxel it keeps a
//! [`PointId`] back-reference to the first point that landed there, so the
//! underlying map can keep growing without invalidating the index.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::error::{MapperError, Result};

use super::point_map::PointMap;
use super::types::{PointId, VoxelKey};

/// Fixed-resolution voxel occupancy index.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    /// Edge length of a voxel.
    resolution: f64,

    /// Occupied voxel -> representative point in the map.
    voxels: HashMap<VoxelKey, PointId>,
}

impl SpatialIndex {
    /// Create an empty index. The resolution must be positive and finite.
    pub fn new(resolution: f64) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(MapperError::InvalidConfig(format!(
                "voxel resolution must be positive and finite, got {}",
                resolution
            )));
        }
        Ok(Self {
            resolution,
            voxels: HashMap::new(),
        })
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Voxel containing `point` at this index's resolution.
    pub fn voxel_key(&self, point: &Vector3<f64>) -> VoxelKey {
        VoxelKey::from_point(point, self.resolution)
    }

    /// Whether `point` has a distinct voxel key at this resolution.
    pub fn is_indexable(&self, point: &Vector3<f64>) -> bool {
        VoxelKey::try_from_point(point, self.resolution).is_some()
    }

    /// Whether a point has already been indexed in the voxel containing `point`.
    pub fn is_voxel_occupied_at(&self, point: &Vector3<f64>) -> bool {
        self.voxels.contains_key(&self.voxel_key(point))
    }

    /// Representative point of the voxel containing `point`, if any.
    pub fn indexed_point_at(&self, point: &Vector3<f64>) -> Option<PointId> {
        self.voxels.get(&self.voxel_key(point)).copied()
    }

    /// Append `point` to `map` and index it.
    ///
    /// If the voxel is already occupied its representative is kept; the point
    /// is still appended to the map.
    pub fn add_point_to_map(&mut self, point: Vector3<f64>, map: &mut PointMap) -> PointId {
        let key = self.voxel_key(&point);
        let id = map.push(point);
        self.voxels.entry(key).or_insert(id);
        id
    }

    /// Number of occupied voxels.
    pub fn occupied_voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// Iterate over occupied voxels and their representative points.
    pub fn occupied_voxels(&self) -> impl Iterator<Item = (&VoxelKey, &PointId)> {
        self.voxels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_resolution() {
        assert!(SpatialIndex::new(0.0).is_err());
        assert!(SpatialIndex::new(-0.1).is_err());
        assert!(SpatialIndex::new(f64::NAN).is_err());
        assert!(SpatialIndex::new(0.1).is_ok());
    }

    #[test]
    fn test_is_indexable() {
        let index = SpatialIndex::new(0.1).unwrap();
        assert!(index.is_indexable(&Vector3::new(-1e6, 3.0, 1e12)));
        assert!(!index.is_indexable(&Vector3::new(1e19, 0.0, 0.0)));
        assert!(!index.is_indexable(&Vector3::new(0.0, f64::NAN, 0.0)));
    }

    #[test]
    fn test_add_point_marks_voxel_and_appends() {
        let mut index = SpatialIndex::new(0.1).unwrap();
        let mut map = PointMap::new();
        let p = Vector3::new(0.01, 0.02, 0.03);

        assert!(!index.is_voxel_occupied_at(&p));
        let id = index.add_point_to_map(p, &mut map);

        assert!(index.is_voxel_occupied_at(&p));
        assert!(index.is_voxel_occupied_at(&Vector3::new(0.09, 0.09, 0.09)));
        assert!(!index.is_voxel_occupied_at(&Vector3::new(0.11, 0.0, 0.0)));
        assert_eq!(index.indexed_point_at(&p), Some(id));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_representative_is_first_point() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        let mut map = PointMap::new();

        let first = index.add_point_to_map(Vector3::new(0.1, 0.1, 0.1), &mut map);
        let second = index.add_point_to_map(Vector3::new(0.9, 0.9, 0.9), &mut map);

        assert_ne!(first, second);
        assert_eq!(index.occupied_voxel_count(), 1);
        assert_eq!(index.indexed_point_at(&Vector3::new(0.5, 0.5, 0.5)), Some(first));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_back_references_survive_unindexed_growth() {
        let mut index = SpatialIndex::new(0.1).unwrap();
        let mut map = PointMap::new();
        let p = Vector3::new(3.0, -2.0, 1.0);
        let id = index.add_point_to_map(p, &mut map);

        // Grow the map outside the index
        for i in 0..1000 {
            map.push(Vector3::new(i as f64, 0.0, 0.0));
        }

        let found = index.indexed_point_at(&p).unwrap();
        assert_eq!(found, id);
        assert_eq!(map.get(found), Some(&p));
    }
}
