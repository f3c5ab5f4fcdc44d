//! OccupancyMap - point storage paired with its voxel index.
//!
//! Insertion policy:
//! - voxel unoccupied: the point goes through the index, which appends it to
//!   the map and records it as the voxel's representative;
//! - voxel occupied: the point is appended to the map only; the index is not
//!   touched.
//!
//! The map keeps every point it is given. Only the index is deduplicated per
//! voxel, so map size grows with input while the index grows with the volume
//! covered.

use nalgebra::Vector3;

use crate::error::Result;

use super::point_map::PointMap;
use super::spatial_index::SpatialIndex;
use super::types::PointId;

/// Outcome of inserting one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// First point in its voxel: appended and indexed.
    Indexed(PointId),
    /// Voxel already occupied: appended only.
    Unindexed(PointId),
}

impl Insertion {
    pub fn point_id(&self) -> PointId {
        match *self {
            Insertion::Indexed(id) | Insertion::Unindexed(id) => id,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Insertion::Indexed(_))
    }
}

/// World-frame map with a voxel occupancy index over it.
#[derive(Debug, Clone)]
pub struct OccupancyMap {
    points: PointMap,
    index: SpatialIndex,
}

impl OccupancyMap {
    /// Create an empty map and its index at the given voxel resolution.
    pub fn new(resolution: f64) -> Result<Self> {
        Ok(Self {
            points: PointMap::new(),
            index: SpatialIndex::new(resolution)?,
        })
    }

    /// Whether `point` can be inserted without its voxel key saturating.
    pub fn is_indexable(&self, point: &Vector3<f64>) -> bool {
        self.index.is_indexable(point)
    }

    /// Insert a world-frame point following the occupancy policy.
    ///
    /// The point must pass [`OccupancyMap::is_indexable`]; out-of-range
    /// coordinates would share a saturated voxel.
    pub fn insert(&mut self, point: Vector3<f64>) -> Insertion {
        if !self.index.is_voxel_occupied_at(&point) {
            Insertion::Indexed(self.index.add_point_to_map(point, &mut self.points))
        } else {
            Insertion::Unindexed(self.points.push(point))
        }
    }

    pub fn points(&self) -> &PointMap {
        &self.points
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Number of stored points (indexed or not).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn occupied_voxel_count(&self) -> usize {
        self.index.occupied_voxel_count()
    }

    pub fn resolution(&self) -> f64 {
        self.index.resolution()
    }

    /// Representative points of all occupied voxels, one per voxel.
    pub fn indexed_points(&self) -> Vec<Vector3<f64>> {
        self.index
            .occupied_voxels()
            .filter_map(|(_, id)| self.points.get(*id).copied())
            .collect()
    }

    /// Copy of all stored points in insertion order.
    pub fn snapshot(&self) -> Vec<Vector3<f64>> {
        self.points.points().to_vec()
    }
}
