//! Map module - world-frame point storage and its occupancy index.
//!
//! This module contains:
//! - [`PointMap`] - append-only owner of all world-frame points
//! - [`SpatialIndex`] - voxel occupancy index holding [`PointId`] back-references
//! - [`OccupancyMap`] - the two bundled together with the insertion policy
//!
//! # Example
//!
//! ```ignore
//! use uav_mapper::map::OccupancyMap;
//!
//! let mut map = OccupancyMap::new(0.1)?;
//! map.insert(Vector3::new(0.0, 0.0, 0.0)); // indexed
//! map.insert(Vector3::new(0.05, 0.0, 0.0)); // same voxel: stored, not indexed
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.occupied_voxel_count(), 1);
//! ```

pub mod occupancy_map;
pub mod point_map;
pub mod spatial_index;
pub mod types;

pub use occupancy_map::{Insertion, OccupancyMap};
pub use point_map::PointMap;
pub use spatial_index::SpatialIndex;
pub use types::{PointId, VoxelKey};
