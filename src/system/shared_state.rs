//! Shared state between the drain thread and map consumers.
//!
//! The `SharedState` struct holds all data that needs to be accessed by
//! multiple threads, protected by appropriate synchronization primitives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::Vector3;
use parking_lot::RwLock;

use crate::error::Result;
use crate::map::OccupancyMap;

/// Shared state accessible by the drain thread and downstream readers.
pub struct SharedState {
    /// The world map and its occupancy index.
    /// Protected by RwLock: the drain thread writes, consumers read.
    pub map: RwLock<OccupancyMap>,

    /// Run-status flag: true while a drain cycle is in progress.
    drain_active: AtomicBool,

    /// Request the drain thread to finish and exit.
    shutdown_requested: AtomicBool,
}

impl SharedState {
    /// Create shared state with an empty map at the given voxel resolution.
    pub fn new(resolution: f64) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            map: RwLock::new(OccupancyMap::new(resolution)?),
            drain_active: AtomicBool::new(false),
            shutdown_requested: AtomicBool::new(false),
        }))
    }

    /// Claim the drain slot. Returns false if a drain is already running.
    pub fn try_begin_drain(&self) -> bool {
        self.drain_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Release the drain slot.
    pub fn end_drain(&self) {
        self.drain_active.store(false, Ordering::SeqCst);
    }

    /// Check if a drain cycle is in progress.
    pub fn is_drain_active(&self) -> bool {
        self.drain_active.load(Ordering::SeqCst)
    }

    /// Request shutdown of the drain thread.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown was requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Number of points in the map.
    pub fn map_len(&self) -> usize {
        self.map.read().len()
    }

    /// Number of occupied voxels in the index.
    pub fn occupied_voxel_count(&self) -> usize {
        self.map.read().occupied_voxel_count()
    }

    /// Copy of the map's points in insertion order.
    pub fn map_snapshot(&self) -> Vec<Vector3<f64>> {
        self.map.read().snapshot()
    }
}
