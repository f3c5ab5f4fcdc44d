//! Mapper system orchestration and thread management.
//!
//! This module contains the top-level `MapperSystem` that owns the shared
//! state and spawns the drain thread, along with the scheduler that drives the
//! map builder periodically.

mod mapper_system;
mod scheduler;
pub mod shared_state;

pub use mapper_system::MapperSystem;
pub use scheduler::DrainScheduler;
pub use shared_state::SharedState;
