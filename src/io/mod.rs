//! Loaders for recorded sensor data.

pub mod cloud_csv;

pub use cloud_csv::{load_point_clouds, load_trajectory};
