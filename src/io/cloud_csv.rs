//! CSV loaders for recorded point clouds and trajectories.
//!
//! Both formats are EuRoC-style: comma separated, `#` comment lines (usually
//! the header), one record per line.
//!
//! Clouds: `timestamp_ns, x, y, z` - consecutive rows with the same timestamp
//! form one cloud.
//!
//! Trajectories: `timestamp_ns, tx, ty, tz, qw, qx, qy, qz` - pose of the
//! sensor in the world frame (quaternion w-first).

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use csv::{Reader, ReaderBuilder, StringRecord};
use nalgebra::Vector3;

use crate::cloud::PointCloud;
use crate::geometry::SE3;
use crate::odometry::TrajectoryEntry;

fn open_reader(csv_path: &Path) -> Result<Reader<File>> {
    ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))
}

/// Next record with at least `fields` columns, or `None` at end of file.
fn next_record(
    records: &mut csv::StringRecordsIter<'_, File>,
    csv_path: &Path,
    fields: usize,
    line: usize,
) -> Result<Option<StringRecord>> {
    let Some(rec) = records.next() else {
        return Ok(None);
    };
    let rec = rec.with_context(|| format!("{}: bad record {}", csv_path.display(), line))?;
    if rec.len() < fields {
        bail!(
            "{}: record {} has {} fields, expected {}",
            csv_path.display(),
            line,
            rec.len(),
            fields
        );
    }
    Ok(Some(rec))
}

fn field<T>(rec: &StringRecord, i: usize, csv_path: &Path, line: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    rec[i].parse().with_context(|| {
        format!(
            "{}: bad value {:?} in field {} of record {}",
            csv_path.display(),
            &rec[i],
            i,
            line
        )
    })
}

/// Load point clouds, grouping consecutive rows that share a timestamp.
pub fn load_point_clouds<P: AsRef<Path>>(csv_path: P) -> Result<Vec<PointCloud>> {
    let csv_path = csv_path.as_ref();
    let mut rdr = open_reader(csv_path)?;
    let mut records = rdr.records();

    let mut clouds: Vec<PointCloud> = Vec::new();
    let mut line = 1;
    while let Some(rec) = next_record(&mut records, csv_path, 4, line)? {
        let ts: u64 = field(&rec, 0, csv_path, line)?;
        let point: Vector3<f64> = Vector3::new(
            field(&rec, 1, csv_path, line)?,
            field(&rec, 2, csv_path, line)?,
            field(&rec, 3, csv_path, line)?,
        );

        match clouds.last_mut() {
            Some(cloud) if cloud.timestamp_ns == ts => cloud.points.push(point),
            _ => clouds.push(PointCloud::new(ts, vec![point])),
        }
        line += 1;
    }
    Ok(clouds)
}

/// Load a timestamped pose trajectory.
pub fn load_trajectory<P: AsRef<Path>>(csv_path: P) -> Result<Vec<TrajectoryEntry>> {
    let csv_path = csv_path.as_ref();
    let mut rdr = open_reader(csv_path)?;
    let mut records = rdr.records();

    let mut entries = Vec::new();
    let mut line = 1;
    while let Some(rec) = next_record(&mut records, csv_path, 8, line)? {
        let ts: u64 = field(&rec, 0, csv_path, line)?;
        let translation: Vector3<f64> = Vector3::new(
            field(&rec, 1, csv_path, line)?,
            field(&rec, 2, csv_path, line)?,
            field(&rec, 3, csv_path, line)?,
        );

        // Orientation quaternion - w-first format
        let qw: f64 = field(&rec, 4, csv_path, line)?;
        let qx: f64 = field(&rec, 5, csv_path, line)?;
        let qy: f64 = field(&rec, 6, csv_path, line)?;
        let qz: f64 = field(&rec, 7, csv_path, line)?;

        entries.push(TrajectoryEntry {
            timestamp_ns: ts,
            pose: SE3::from_quaternion(qw, qx, qy, qz, translation),
        });
        line += 1;
    }
    Ok(entries)
}
