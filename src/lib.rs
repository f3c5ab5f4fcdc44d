pub mod cloud;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod map;
pub mod mapping;
pub mod odometry;
pub mod sync;
pub mod system;

pub use cloud::PointCloud;
pub use config::MapperConfig;
pub use error::{MapperError, Result};
pub use system::MapperSystem;
