//! FrameSynchronizer - lock-protected buffer of incoming clouds.

use parking_lot::Mutex;

use crate::cloud::PointCloud;

/// Buffers clouds from any number of producer threads and releases them in
/// increasing timestamp order.
///
/// `add_message` and `get_sorted` may interleave freely; the internal mutex
/// serializes them. Each cloud is returned by exactly one `get_sorted` call.
#[derive(Debug, Default)]
pub struct FrameSynchronizer {
    buffer: Mutex<Vec<PointCloud>>,
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Buffer a newly arrived cloud.
    pub fn add_message(&self, cloud: PointCloud) {
        self.buffer.lock().push(cloud);
    }

    /// Take every buffered cloud, sorted by timestamp.
    ///
    /// Clouds sharing a timestamp keep their arrival order.
    pub fn get_sorted(&self) -> Vec<PointCloud> {
        let mut clouds = std::mem::take(&mut *self.buffer.lock());
        clouds.sort_by_key(|c| c.timestamp_ns);
        clouds
    }

    /// Number of clouds currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use nalgebra::Vector3;

    use super::*;

    fn cloud(ts: u64, tag: f64) -> PointCloud {
        PointCloud::new(ts, vec![Vector3::new(tag, 0.0, 0.0)])
    }

    #[test]
    fn test_get_sorted_orders_by_timestamp() {
        let sync = FrameSynchronizer::new();
        sync.add_message(cloud(30, 0.0));
        sync.add_message(cloud(10, 0.0));
        sync.add_message(cloud(20, 0.0));

        let ts: Vec<u64> = sync.get_sorted().iter().map(|c| c.timestamp_ns).collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }

    #[test]
    fn test_get_sorted_drains_buffer() {
        let sync = FrameSynchronizer::new();
        sync.add_message(cloud(1, 0.0));

        assert_eq!(sync.get_sorted().len(), 1);
        assert!(sync.is_empty());
        assert!(sync.get_sorted().is_empty());
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let sync = FrameSynchronizer::new();
        sync.add_message(cloud(5, 1.0));
        sync.add_message(cloud(5, 2.0));
        sync.add_message(cloud(4, 0.0));

        let tags: Vec<f64> = sync.get_sorted().iter().map(|c| c.points[0].x).collect();
        assert_eq!(tags, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let sync = Arc::new(FrameSynchronizer::new());
        let producers: Vec<_> = (0..4u64)
            .map(|p| {
                let sync = Arc::clone(&sync);
                thread::spawn(move || {
                    for i in 0..250u64 {
                        sync.add_message(cloud(p * 1000 + i, 0.0));
                    }
                })
            })
            .collect();

        // Drain while producers are running
        let mut seen = Vec::new();
        while seen.len() < 1000 {
            seen.extend(sync.get_sorted().into_iter().map(|c| c.timestamp_ns));
            thread::yield_now();
        }
        for handle in producers {
            handle.join().unwrap();
        }
        seen.extend(sync.get_sorted().into_iter().map(|c| c.timestamp_ns));
        assert_eq!(seen.len(), 1000);

        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 1000);
    }
}
