//! Map Builder - folds synchronized clouds into the world map.
//!
//! Each drain cycle:
//! 1. Takes every buffered cloud from the synchronizer, oldest first
//! 2. Updates the pose integrator with the cloud
//! 3. Builds T = [R t; 0 1] from the integrated pose
//! 4. Transforms the cloud into the world frame
//! 5. Inserts each point through the occupancy policy
//!
//! A cloud that fails (bad input, integrator error) is logged and skipped;
//! clouds already folded in during the same cycle stay in the map.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cloud::{PointCloud, is_finite};
use crate::config::MapperConfig;
use crate::error::{MapperError, Result};
use crate::geometry::{homogeneous, transform_cloud};
use crate::odometry::PoseIntegrator;
use crate::sync::FrameSynchronizer;
use crate::system::SharedState;

use super::report::{CloudReport, DrainReport, MapBuilderStats};

/// Drives the pose integrator and grows the shared map.
pub struct MapBuilder<P: PoseIntegrator> {
    /// Source of time-ordered clouds.
    synchronizer: Arc<FrameSynchronizer>,

    /// Pose estimate for each new cloud.
    integrator: P,

    /// Map and index (written only by this builder).
    shared: Arc<SharedState>,

    stats: MapBuilderStats,
}

impl<P: PoseIntegrator> MapBuilder<P> {
    /// Create a builder over existing shared state.
    ///
    /// Fails with [`MapperError::NotInitialized`] if the integrator has not
    /// been initialized.
    pub fn new(
        shared: Arc<SharedState>,
        synchronizer: Arc<FrameSynchronizer>,
        integrator: P,
    ) -> Result<Self> {
        if !integrator.is_initialized() {
            return Err(MapperError::NotInitialized);
        }
        Ok(Self {
            synchronizer,
            integrator,
            shared,
            stats: MapBuilderStats::default(),
        })
    }

    /// Create a builder with fresh shared state and synchronizer from `config`.
    pub fn from_config(config: &MapperConfig, integrator: P) -> Result<Self> {
        config.validate()?;
        let shared = SharedState::new(config.voxel_resolution)?;
        Self::new(shared, Arc::new(FrameSynchronizer::new()), integrator)
    }

    /// Run one drain cycle over everything buffered so far.
    pub fn drain(&mut self) -> DrainReport {
        let clouds = self.synchronizer.get_sorted();
        let mut report = DrainReport::default();

        if clouds.is_empty() {
            self.stats.absorb(&report);
            return report;
        }

        for cloud in &clouds {
            match self.process_cloud(cloud) {
                Ok(cloud_report) => report.record_cloud(&cloud_report),
                Err(e) => {
                    warn!("Skipping cloud at {} ns: {}", cloud.timestamp_ns, e);
                    report.clouds_skipped += 1;
                }
            }
        }

        debug!(
            "Drain: {} clouds ({} skipped), +{} indexed, +{} unindexed, map={} voxels={}",
            report.clouds_processed,
            report.clouds_skipped,
            report.points_indexed,
            report.points_unindexed,
            self.shared.map_len(),
            self.shared.occupied_voxel_count()
        );

        self.stats.absorb(&report);
        report
    }

    /// Integrate one cloud and fold its points into the map.
    ///
    /// Nothing is inserted unless the whole cloud transforms cleanly.
    pub fn process_cloud(&mut self, cloud: &PointCloud) -> Result<CloudReport> {
        cloud.validate()?;

        self.integrator.update(cloud)?;

        let r = self.integrator.integrated_rotation();
        let t = self.integrator.integrated_translation();
        let tf = homogeneous(&r, &t);

        let world_points = transform_cloud(&tf, &cloud.points);

        let mut map = self.shared.map.write();
        if let Some(index) = world_points
            .iter()
            .position(|p| !is_finite(p) || !map.is_indexable(p))
        {
            return Err(MapperError::MalformedPoint {
                timestamp_ns: cloud.timestamp_ns,
                index,
            });
        }

        let mut report = CloudReport::default();
        for p in world_points {
            if map.insert(p).is_indexed() {
                report.points_indexed += 1;
            } else {
                report.points_unindexed += 1;
            }
        }

        Ok(report)
    }

    pub fn shared_state(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn synchronizer(&self) -> &Arc<FrameSynchronizer> {
        &self.synchronizer
    }

    pub fn integrator(&self) -> &P {
        &self.integrator
    }

    pub fn stats(&self) -> &MapBuilderStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Matrix3, UnitQuaternion, Vector3};

    use super::*;
    use crate::config::OdometryConfig;
    use crate::geometry::SE3;
    use crate::odometry::TrajectoryPlayback;
    use approx::assert_relative_eq;

    fn playback(poses: Vec<SE3>) -> TrajectoryPlayback {
        let mut p = TrajectoryPlayback::new(poses);
        p.initialize(&OdometryConfig::default()).unwrap();
        p
    }

    fn translations(ts: &[[f64; 3]]) -> TrajectoryPlayback {
        let ts: Vec<_> = ts.iter().map(|t| Vector3::new(t[0], t[1], t[2])).collect();
        let mut p = TrajectoryPlayback::from_translations(&ts);
        p.initialize(&OdometryConfig::default()).unwrap();
        p
    }

    fn builder(integrator: TrajectoryPlayback) -> MapBuilder<TrajectoryPlayback> {
        MapBuilder::from_config(&MapperConfig::default(), integrator).unwrap()
    }

    fn origin_cloud(ts: u64) -> PointCloud {
        PointCloud::new(ts, vec![Vector3::zeros()])
    }

    #[test]
    fn test_uninitialized_integrator_is_setup_fault() {
        let result = MapBuilder::from_config(
            &MapperConfig::default(),
            TrajectoryPlayback::new(Vec::new()),
        );
        assert!(matches!(result, Err(MapperError::NotInitialized)));
    }

    #[test]
    fn test_three_clouds_along_x() {
        let mut mb = builder(translations(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
        ]));

        // Arrive out of order; the synchronizer restores time order
        mb.synchronizer().add_message(origin_cloud(30));
        mb.synchronizer().add_message(origin_cloud(10));
        mb.synchronizer().add_message(origin_cloud(20));

        let report = mb.drain();
        assert_eq!(report.clouds_processed, 3);
        assert_eq!(report.points_indexed, 3);
        assert_eq!(report.points_unindexed, 0);

        let snapshot = mb.shared_state().map_snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_relative_eq!(snapshot[0], Vector3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(snapshot[1], Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(snapshot[2], Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(mb.shared_state().occupied_voxel_count(), 3);
    }

    #[test]
    fn test_same_voxel_stores_both_indexes_one() {
        let mut mb = builder(translations(&[[0.0, 0.0, 0.0], [0.01, 0.02, 0.0]]));
        mb.synchronizer().add_message(origin_cloud(1));
        mb.synchronizer().add_message(origin_cloud(2));

        let report = mb.drain();

        assert_eq!(report.points_indexed, 1);
        assert_eq!(report.points_unindexed, 1);
        assert_eq!(mb.shared_state().map_len(), 2);
        assert_eq!(mb.shared_state().occupied_voxel_count(), 1);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut mb = builder(translations(&[[0.0, 0.0, 0.0]]));
        mb.synchronizer().add_message(origin_cloud(1));
        mb.drain();

        let before = mb.shared_state().map_snapshot();
        let voxels = mb.shared_state().occupied_voxel_count();

        let report = mb.drain();

        assert!(report.is_empty());
        assert_eq!(mb.shared_state().map_snapshot(), before);
        assert_eq!(mb.shared_state().occupied_voxel_count(), voxels);
        assert_eq!(mb.stats().drains, 2);
        assert_eq!(mb.stats().empty_drains, 1);
    }

    #[test]
    fn test_identity_pose_keeps_coordinates() {
        let pts = vec![
            Vector3::new(0.123, -4.5, 7.25),
            Vector3::new(-1e3, 2e-3, 0.0),
        ];
        let mut mb = builder(playback(vec![SE3::identity()]));
        mb.synchronizer().add_message(PointCloud::new(0, pts.clone()));
        mb.drain();

        let snapshot = mb.shared_state().map_snapshot();
        for (a, b) in pts.iter().zip(snapshot.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotation_applied_before_translation() {
        let pose = SE3 {
            rotation: UnitQuaternion::from_axis_angle(
                &Vector3::z_axis(),
                std::f64::consts::FRAC_PI_2,
            ),
            translation: Vector3::new(10.0, 0.0, 0.0),
        };
        let mut mb = builder(playback(vec![pose]));
        mb.synchronizer()
            .add_message(PointCloud::new(0, vec![Vector3::new(1.0, 0.0, 0.0)]));
        mb.drain();

        let snapshot = mb.shared_state().map_snapshot();
        assert_relative_eq!(snapshot[0], Vector3::new(10.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(
            mb.integrator().integrated_rotation(),
            Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_malformed_cloud_skipped_rest_kept() {
        let mut mb = builder(translations(&[[0.0, 0.0, 0.0], [5.0, 0.0, 0.0]]));
        mb.synchronizer().add_message(origin_cloud(1));
        mb.synchronizer().add_message(PointCloud::new(
            2,
            vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(f64::NAN, 0.0, 0.0)],
        ));
        mb.synchronizer().add_message(origin_cloud(3));

        let report = mb.drain();

        assert_eq!(report.clouds_processed, 2);
        assert_eq!(report.clouds_skipped, 1);
        // Bad cloud contributes nothing, not even its valid first point
        let snapshot = mb.shared_state().map_snapshot();
        assert_eq!(snapshot.len(), 2);
        // Rejected before the integrator saw it, so cloud 3 gets the second pose
        assert_relative_eq!(snapshot[1], Vector3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_points_beyond_voxel_key_range_are_rejected() {
        let mut mb = builder(translations(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]));
        // Finite, but floor(x / 0.1) overflows i64 and both would share a key
        let far = PointCloud::new(
            1,
            vec![Vector3::new(1e19, 0.0, 0.0), Vector3::new(5e19, 0.0, 0.0)],
        );

        let err = mb.process_cloud(&far).unwrap_err();
        assert!(matches!(
            err,
            MapperError::MalformedPoint {
                timestamp_ns: 1,
                index: 0
            }
        ));
        assert_eq!(mb.shared_state().map_len(), 0);
        assert_eq!(mb.shared_state().occupied_voxel_count(), 0);

        let report = mb
            .process_cloud(&PointCloud::new(2, vec![Vector3::new(1e6, 0.0, 0.0)]))
            .unwrap();
        assert_eq!(report.points_indexed, 1);
    }

    #[test]
    fn test_integrator_failure_mid_batch_keeps_earlier_clouds() {
        let mut mb = builder(translations(&[[0.0, 0.0, 0.0]]));
        mb.synchronizer().add_message(origin_cloud(1));
        mb.synchronizer().add_message(origin_cloud(2));

        let report = mb.drain();

        assert_eq!(report.clouds_processed, 1);
        assert_eq!(report.clouds_skipped, 1);
        assert_eq!(mb.shared_state().map_len(), 1);
    }

    #[test]
    fn test_map_grows_monotonically_and_index_only_on_new_voxels() {
        let poses: Vec<SE3> = (0..20)
            .map(|i| SE3 {
                rotation: UnitQuaternion::from_euler_angles(0.0, 0.0, i as f64 * 0.3),
                translation: Vector3::new(i as f64 * 0.05, 0.0, 0.0),
            })
            .collect();
        let mut mb = builder(playback(poses));

        let local: Vec<_> = (0..10)
            .map(|k| Vector3::new(k as f64 * 0.07, 0.3, -0.1))
            .collect();

        let mut last_len = 0;
        for ts in 0..20u64 {
            let voxels_before = mb.shared_state().occupied_voxel_count();
            mb.synchronizer()
                .add_message(PointCloud::new(ts, local.clone()));
            let report = mb.drain();

            let len = mb.shared_state().map_len();
            assert!(len >= last_len);
            assert_eq!(len - last_len, report.points_added());
            assert_eq!(
                mb.shared_state().occupied_voxel_count() - voxels_before,
                report.points_indexed
            );
            last_len = len;
        }

        assert_eq!(mb.shared_state().map_len(), 200);
        assert_eq!(mb.stats().clouds_processed, 20);
    }
}
