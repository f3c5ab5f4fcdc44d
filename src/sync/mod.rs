//! Frame synchronization between sensor producers and the map builder.
//!
//! Producers push clouds as they arrive; the drain loop periodically takes
//! everything buffered so far, sorted by acquisition time.

mod frame_synchronizer;

pub use frame_synchronizer::FrameSynchronizer;
