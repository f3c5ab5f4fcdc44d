//! Pose playback from a recorded trajectory.

use nalgebra::{Matrix3, Vector3};

use crate::cloud::PointCloud;
use crate::config::OdometryConfig;
use crate::error::{MapperError, Result};
use crate::geometry::SE3;

use super::PoseIntegrator;

/// Widest gap between two trajectory samples a cloud may be interpolated
/// across (50 ms).
pub const DEFAULT_MAX_POSE_GAP_NS: u64 = 50_000_000;

/// A timestamped sensor pose.
#[derive(Debug, Clone)]
pub struct TrajectoryEntry {
    pub timestamp_ns: u64,
    pub pose: SE3,
}

enum Schedule {
    /// The k-th update takes the k-th pose.
    Sequential { poses: Vec<SE3>, cursor: usize },

    /// Each update looks its pose up by the cloud's timestamp.
    Timed {
        /// Sorted by timestamp.
        entries: Vec<TrajectoryEntry>,
        max_gap_ns: u64,
        last_ns: Option<u64>,
    },
}

/// Replays a recorded trajectory as the integrated pose.
///
/// Useful with externally estimated trajectories (motion capture, GNSS/INS)
/// and for driving the map builder deterministically. A timed trajectory
/// matches poses to clouds by timestamp, interpolating between samples, so
/// the trajectory and sensor rates need not agree. A sequential one hands out
/// poses in order, one per cloud.
pub struct TrajectoryPlayback {
    schedule: Schedule,
    current: SE3,
    initialized: bool,
}

impl TrajectoryPlayback {
    /// Sequential playback: the k-th `update` moves to the k-th pose.
    pub fn new(poses: Vec<SE3>) -> Self {
        Self::with_schedule(Schedule::Sequential { poses, cursor: 0 })
    }

    /// Sequential playback of pure translations with identity rotation.
    pub fn from_translations(translations: &[Vector3<f64>]) -> Self {
        Self::new(
            translations
                .iter()
                .map(|t| SE3 {
                    translation: *t,
                    ..SE3::identity()
                })
                .collect(),
        )
    }

    /// Timed playback: each cloud gets the pose at its own timestamp.
    pub fn timed(mut entries: Vec<TrajectoryEntry>) -> Self {
        entries.sort_by_key(|e| e.timestamp_ns);
        Self::with_schedule(Schedule::Timed {
            entries,
            max_gap_ns: DEFAULT_MAX_POSE_GAP_NS,
            last_ns: None,
        })
    }

    /// Set the widest sample gap a timed trajectory interpolates across.
    /// No effect on sequential playback.
    pub fn with_max_gap_ns(mut self, gap_ns: u64) -> Self {
        if let Schedule::Timed { max_gap_ns, .. } = &mut self.schedule {
            *max_gap_ns = gap_ns;
        }
        self
    }

    fn with_schedule(schedule: Schedule) -> Self {
        Self {
            schedule,
            current: SE3::identity(),
            initialized: false,
        }
    }

    /// Poses not yet consumed (sequential) or not yet passed in time (timed).
    pub fn remaining(&self) -> usize {
        match &self.schedule {
            Schedule::Sequential { poses, cursor } => poses.len() - cursor,
            Schedule::Timed {
                entries, last_ns, ..
            } => match last_ns {
                None => entries.len(),
                Some(t) => entries.len() - entries.partition_point(|e| e.timestamp_ns <= *t),
            },
        }
    }
}

/// Pose at `timestamp_ns`: an exact sample, or the interpolation between the
/// two samples around it when they are at most `max_gap_ns` apart.
fn pose_at(entries: &[TrajectoryEntry], max_gap_ns: u64, timestamp_ns: u64) -> Result<SE3> {
    let i = entries.partition_point(|e| e.timestamp_ns < timestamp_ns);

    if let Some(entry) = entries.get(i).filter(|e| e.timestamp_ns == timestamp_ns) {
        return Ok(entry.pose.clone());
    }
    if i == entries.len() {
        return Err(MapperError::TrajectoryExhausted { timestamp_ns });
    }
    if i == 0 {
        return Err(MapperError::PoseUnavailable { timestamp_ns });
    }

    let (before, after) = (&entries[i - 1], &entries[i]);
    let span = after.timestamp_ns - before.timestamp_ns;
    if span > max_gap_ns {
        return Err(MapperError::PoseUnavailable { timestamp_ns });
    }
    let alpha = (timestamp_ns - before.timestamp_ns) as f64 / span as f64;
    Ok(before.pose.interpolate(&after.pose, alpha))
}

impl PoseIntegrator for TrajectoryPlayback {
    fn initialize(&mut self, _config: &OdometryConfig) -> Result<()> {
        match &mut self.schedule {
            Schedule::Sequential { cursor, .. } => *cursor = 0,
            Schedule::Timed { last_ns, .. } => *last_ns = None,
        }
        self.current = SE3::identity();
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self, cloud: &PointCloud) -> Result<()> {
        if !self.initialized {
            return Err(MapperError::NotInitialized);
        }
        let timestamp_ns = cloud.timestamp_ns;
        match &mut self.schedule {
            Schedule::Sequential { poses, cursor } => {
                let pose = poses
                    .get(*cursor)
                    .ok_or(MapperError::TrajectoryExhausted { timestamp_ns })?;
                self.current = pose.clone();
                *cursor += 1;
            }
            Schedule::Timed {
                entries,
                max_gap_ns,
                last_ns,
            } => {
                self.current = pose_at(entries, *max_gap_ns, timestamp_ns)?;
                *last_ns = Some(timestamp_ns);
            }
        }
        Ok(())
    }

    fn integrated_rotation(&self) -> Matrix3<f64> {
        self.current.rotation_matrix()
    }

    fn integrated_translation(&self) -> Vector3<f64> {
        self.current.translation
    }
}
