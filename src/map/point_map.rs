//! PointMap - append-only world-frame point storage.

use nalgebra::Vector3;

use super::types::PointId;

/// Ordered world-frame point storage.
///
/// The map is the single owner of point data. It only grows: points are never
/// removed or reordered, which keeps every [`PointId`] handed out valid.
#[derive(Debug, Default, Clone)]
pub struct PointMap {
    points: Vec<Vector3<f64>>,
}

impl PointMap {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Append a point and return its handle.
    pub fn push(&mut self, point: Vector3<f64>) -> PointId {
        let id = PointId::new(self.points.len());
        self.points.push(point);
        id
    }

    pub fn get(&self, id: PointId) -> Option<&Vector3<f64>> {
        self.points.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in insertion order.
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }
}
