//! Mapper System - main entry point and thread orchestration.
//!
//! The `MapperSystem` is the top-level struct that users interact with.
//! It owns the shared state and the frame synchronizer, and spawns the drain
//! thread that runs the map builder.

use std::sync::Arc;

use nalgebra::Vector3;
use tracing::info;

use crate::cloud::PointCloud;
use crate::config::MapperConfig;
use crate::error::Result;
use crate::mapping::{DrainReport, MapBuilder, MapBuilderStats};
use crate::odometry::PoseIntegrator;
use crate::sync::FrameSynchronizer;

use super::scheduler::DrainScheduler;
use super::shared_state::SharedState;

/// Main mapping system: producers feed clouds in, consumers read the map.
pub struct MapperSystem {
    /// Shared state (map, flags) accessible by all threads.
    shared: Arc<SharedState>,

    /// Buffer between producers and the drain thread.
    synchronizer: Arc<FrameSynchronizer>,

    /// Handle to the drain thread.
    scheduler: DrainScheduler,
}

impl MapperSystem {
    /// Validate `config`, initialize `integrator` and start the drain thread.
    ///
    /// Any failure here is a setup fault; nothing is retried.
    pub fn new<P: PoseIntegrator + 'static>(config: &MapperConfig, mut integrator: P) -> Result<Self> {
        config.validate()?;
        integrator.initialize(&config.odometry)?;

        let shared = SharedState::new(config.voxel_resolution)?;
        let synchronizer = Arc::new(FrameSynchronizer::new());
        let builder = MapBuilder::new(shared.clone(), synchronizer.clone(), integrator)?;

        info!(
            "Mapper started: voxel resolution {}, drain period {:?}",
            config.voxel_resolution,
            config.drain_period()
        );
        let scheduler = DrainScheduler::spawn(builder, config.drain_period());

        Ok(Self {
            shared,
            synchronizer,
            scheduler,
        })
    }

    /// Producer entry point: buffer a newly arrived cloud.
    ///
    /// Safe to call from any thread while the drain thread runs.
    pub fn add_point_cloud(&self, cloud: PointCloud) {
        self.synchronizer.add_message(cloud);
    }

    /// Drain now instead of waiting for the next period.
    pub fn request_drain(&self) -> Option<DrainReport> {
        self.scheduler.request_drain()
    }

    /// Get a reference to the shared state for map consumers.
    pub fn shared_state(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Clone of the synchronizer handle for producer threads.
    pub fn synchronizer(&self) -> Arc<FrameSynchronizer> {
        Arc::clone(&self.synchronizer)
    }

    /// Number of stored map points.
    pub fn map_len(&self) -> usize {
        self.shared.map_len()
    }

    /// Number of voxels in the occupancy index.
    pub fn occupied_voxel_count(&self) -> usize {
        self.shared.occupied_voxel_count()
    }

    /// Copy of the accumulated world-frame map.
    pub fn map_snapshot(&self) -> Vec<Vector3<f64>> {
        self.shared.map_snapshot()
    }

    /// Shutdown the system gracefully.
    ///
    /// Signals the drain thread, waits for its final drain and returns the
    /// builder statistics. Later calls return `None`.
    pub fn shutdown(&mut self) -> Option<MapBuilderStats> {
        self.shared.request_shutdown();
        self.scheduler.shutdown()
    }
}

impl Drop for MapperSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
