use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use uav_mapper::io::cloud_csv::{load_point_clouds, load_trajectory};
use uav_mapper::odometry::{IcpOdometry, PoseIntegrator, TrajectoryPlayback};
use uav_mapper::{MapperConfig, MapperSystem, PointCloud};

/// Delay between clouds handed to the mapper, roughly a 20 Hz sensor.
const PRODUCER_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let clouds_path = args.next();
    let config_path = args.next();
    let trajectory_path = args.next();

    let config = match &config_path {
        Some(path) => MapperConfig::from_file(Path::new(path))?,
        None => MapperConfig::default(),
    };

    let clouds = match &clouds_path {
        Some(path) => {
            info!("Loading point clouds from: {}", path);
            load_point_clouds(path)?
        }
        None => {
            info!("No cloud file given; generating a synthetic corridor scan");
            synthetic_corridor(40, 0.25)
        }
    };
    info!(
        "Loaded {} clouds, {} points total",
        clouds.len(),
        clouds.iter().map(PointCloud::len).sum::<usize>()
    );

    match &trajectory_path {
        Some(path) => {
            let trajectory = load_trajectory(path)?;
            let uncovered = match (trajectory.first(), trajectory.last()) {
                (Some(first), Some(last)) => {
                    info!(
                        "Loaded {} poses covering {} ns to {} ns",
                        trajectory.len(),
                        first.timestamp_ns,
                        last.timestamp_ns
                    );
                    let covered = first.timestamp_ns..=last.timestamp_ns;
                    clouds
                        .iter()
                        .filter(|c| !covered.contains(&c.timestamp_ns))
                        .count()
                }
                _ => clouds.len(),
            };
            if uncovered > 0 {
                warn!(
                    "{} of {} clouds fall outside the trajectory and will be skipped",
                    uncovered,
                    clouds.len()
                );
            }
            run(&config, TrajectoryPlayback::timed(trajectory), clouds)
        }
        None => run(&config, IcpOdometry::new(), clouds),
    }
}

fn run<P: PoseIntegrator + 'static>(
    config: &MapperConfig,
    integrator: P,
    clouds: Vec<PointCloud>,
) -> Result<()> {
    let mut system = MapperSystem::new(config, integrator)?;

    // Simulated sensor driver
    let synchronizer = system.synchronizer();
    let producer = thread::spawn(move || {
        for cloud in clouds {
            synchronizer.add_message(cloud);
            thread::sleep(PRODUCER_INTERVAL);
        }
    });
    if producer.join().is_err() {
        anyhow::bail!("Producer thread panicked");
    }

    let stats = system.shutdown();
    info!(
        "Final map: {} points, {} occupied voxels (resolution {})",
        system.map_len(),
        system.occupied_voxel_count(),
        config.voxel_resolution
    );
    if let Some(stats) = stats {
        info!(
            "Drains: {} ({} empty), clouds: {} processed / {} skipped",
            stats.drains, stats.empty_drains, stats.clouds_processed, stats.clouds_skipped
        );
    }
    Ok(())
}

/// Sensor moving along +x through a corridor with a floor and two side walls.
///
/// Points are expressed in the sensor frame with a little range noise.
fn synthetic_corridor(n_clouds: usize, step: f64) -> Vec<PointCloud> {
    let mut rng = StdRng::seed_from_u64(7);

    let mut world = Vec::new();
    for _ in 0..4000 {
        let x = rng.gen_range(-2.0..(n_clouds as f64 * step + 6.0));
        let a = rng.gen_range(-1.5..1.5);
        match rng.gen_range(0..3) {
            0 => world.push(Vector3::new(x, a, 0.0)),
            1 => world.push(Vector3::new(x, -1.5, a + 1.5)),
            _ => world.push(Vector3::new(x, 1.5, a + 1.5)),
        }
    }

    (0..n_clouds)
        .map(|i| {
            let position = Vector3::new(i as f64 * step, 0.0, 1.0);
            let points = world
                .iter()
                .filter(|p| (*p - position).norm() < 5.0)
                .map(|p| {
                    let noise = Vector3::new(
                        rng.gen_range(-0.005..0.005),
                        rng.gen_range(-0.005..0.005),
                        rng.gen_range(-0.005..0.005),
                    );
                    p - position + noise
                })
                .collect();
            PointCloud::new(1_000_000_000 + i as u64 * 50_000_000, points)
        })
        .collect()
}
