//! Handle types shared by the map storage and the spatial index.

use nalgebra::Vector3;

/// Stable handle to a point in map storage.
///
/// PointIds are the point's offset in the append-only storage. Since the map
/// never removes or reorders points, a PointId stays valid for the lifetime
/// of the map no matter how much the storage grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub usize);

impl PointId {
    pub fn new(offset: usize) -> Self {
        Self(offset)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Integer coordinates of a voxel at a given resolution.
///
/// A point `p` lies in voxel `floor(p / resolution)` along each axis, so each
/// voxel is the half-open cube `[k * res, (k + 1) * res)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl VoxelKey {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Voxel containing `p`. Coordinates beyond the key range saturate, so
    /// callers that need distinct keys check [`VoxelKey::try_from_point`]
    /// first.
    pub fn from_point(p: &Vector3<f64>, resolution: f64) -> Self {
        Self {
            x: (p.x / resolution).floor() as i64,
            y: (p.y / resolution).floor() as i64,
            z: (p.z / resolution).floor() as i64,
        }
    }

    /// Voxel containing `p`, or `None` if a coordinate is non-finite or its
    /// voxel index does not fit in an `i64`.
    pub fn try_from_point(p: &Vector3<f64>, resolution: f64) -> Option<Self> {
        let axis = |c: f64| {
            let k = (c / resolution).floor();
            // i64::MAX rounds up to 2^63 as f64, hence the strict bound
            (k >= i64::MIN as f64 && k < i64::MAX as f64).then_some(k as i64)
        };
        Some(Self {
            x: axis(p.x)?,
            y: axis(p.y)?,
            z: axis(p.z)?,
        })
    }
}

impl std::fmt::Display for VoxelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V({}, {}, {})", self.x, self.y, self.z)
    }
}
