//! Incremental map building.
//!
//! The [`MapBuilder`] turns synchronized sensor clouds into world-frame map
//! points:
//! - pose update per cloud, strictly in timestamp order
//! - rigid transform into the world frame
//! - occupancy-indexed insertion into the shared map

mod map_builder;
mod report;

pub use map_builder::MapBuilder;
pub use report::{CloudReport, DrainReport, MapBuilderStats};
