//! Drain reports and cumulative map builder statistics.

/// Points inserted from a single cloud.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CloudReport {
    /// Points that opened a new voxel (appended and indexed).
    pub points_indexed: usize,
    /// Points that fell into an occupied voxel (appended only).
    pub points_unindexed: usize,
}

impl CloudReport {
    pub fn points_added(&self) -> usize {
        self.points_indexed + self.points_unindexed
    }
}

/// Summary of one drain cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub clouds_processed: usize,
    pub clouds_skipped: usize,
    pub points_indexed: usize,
    pub points_unindexed: usize,
}

impl DrainReport {
    /// True when the synchronizer had nothing buffered.
    pub fn is_empty(&self) -> bool {
        self.clouds_processed == 0 && self.clouds_skipped == 0
    }

    pub fn points_added(&self) -> usize {
        self.points_indexed + self.points_unindexed
    }

    pub(crate) fn record_cloud(&mut self, cloud: &CloudReport) {
        self.clouds_processed += 1;
        self.points_indexed += cloud.points_indexed;
        self.points_unindexed += cloud.points_unindexed;
    }
}

/// Cumulative statistics over the builder's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapBuilderStats {
    /// Drain cycles run, including empty ones.
    pub drains: usize,
    /// Drain cycles that found nothing buffered.
    pub empty_drains: usize,
    pub clouds_processed: usize,
    pub clouds_skipped: usize,
    pub points_indexed: usize,
    pub points_unindexed: usize,
}

impl MapBuilderStats {
    pub(crate) fn absorb(&mut self, report: &DrainReport) {
        self.drains += 1;
        if report.is_empty() {
            self.empty_drains += 1;
        }
        self.clouds_processed += report.clouds_processed;
        self.clouds_skipped += report.clouds_skipped;
        self.points_indexed += report.points_indexed;
        self.points_unindexed += report.points_unindexed;
    }
}
