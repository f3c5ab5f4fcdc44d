//! Hashed-grid nearest neighbour search for ICP correspondences.

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::map::VoxelKey;

/// Bucket grid over a reference cloud.
///
/// The cell size equals the search radius, so the nearest neighbour within the
/// radius always lies in the 27 cells around the query.
pub struct NeighborGrid {
    cell_size: f64,
    points: Vec<Vector3<f64>>,
    cells: HashMap<VoxelKey, Vec<usize>>,
}

impl NeighborGrid {
    /// Build a grid over `points` for searches up to `radius`.
    pub fn new(points: Vec<Vector3<f64>>, radius: f64) -> Self {
        let mut cells: HashMap<VoxelKey, Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            cells
                .entry(VoxelKey::from_point(p, radius))
                .or_default()
                .push(i);
        }
        Self {
            cell_size: radius,
            points,
            cells,
        }
    }

    /// Nearest reference point within the grid radius, with its squared distance.
    pub fn nearest(&self, query: &Vector3<f64>) -> Option<(Vector3<f64>, f64)> {
        let center = VoxelKey::from_point(query, self.cell_size);
        let max_sq = self.cell_size * self.cell_size;
        let mut best: Option<(Vector3<f64>, f64)> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = VoxelKey::new(center.x + dx, center.y + dy, center.z + dz);
                    let Some(bucket) = self.cells.get(&key) else {
                        continue;
                    };
                    for &i in bucket {
                        let d_sq = (self.points[i] - query).norm_squared();
                        if d_sq <= max_sq && best.map_or(true, |(_, b)| d_sq < b) {
                            best = Some((self.points[i], d_sq));
                        }
                    }
                }
            }
        }

        best
    }
}
