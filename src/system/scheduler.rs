//! Drain scheduler - runs the map builder on a fixed period.
//!
//! The builder lives on a dedicated thread. A `crossbeam_channel::tick`
//! ticker fires the drain cycle; explicit drain requests and shutdown arrive
//! over channels. Only one drain runs at a time: the run-status flag in
//! [`SharedState`] is claimed before every cycle and released after it.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, tick, unbounded};
use tracing::{debug, info, warn};

use crate::mapping::{DrainReport, MapBuilder, MapBuilderStats};
use crate::odometry::PoseIntegrator;

use super::shared_state::SharedState;

/// Handle to the drain thread.
pub struct DrainScheduler {
    /// Explicit drain requests; each carries a reply channel.
    trigger_tx: Sender<Sender<Option<DrainReport>>>,

    /// Dropping or sending stops the thread.
    shutdown_tx: Sender<()>,

    handle: Option<JoinHandle<MapBuilderStats>>,
}

impl DrainScheduler {
    /// Move `builder` onto a new thread and drain it every `period`.
    pub fn spawn<P: PoseIntegrator + 'static>(builder: MapBuilder<P>, period: Duration) -> Self {
        let (trigger_tx, trigger_rx) = unbounded::<Sender<Option<DrainReport>>>();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let handle = thread::spawn(move || run(builder, period, trigger_rx, shutdown_rx));

        Self {
            trigger_tx,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Run a drain cycle now and wait for its report.
    ///
    /// Returns `None` if the thread has stopped or a drain was already active.
    pub fn request_drain(&self) -> Option<DrainReport> {
        let (reply_tx, reply_rx) = bounded(1);
        self.trigger_tx.send(reply_tx).ok()?;
        reply_rx.recv().ok().flatten()
    }

    /// Stop the thread after a final drain and return the builder's statistics.
    pub fn shutdown(&mut self) -> Option<MapBuilderStats> {
        let handle = self.handle.take()?;
        let _ = self.shutdown_tx.try_send(());
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("Map drain thread panicked");
                None
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for DrainScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Thread body.
fn run<P: PoseIntegrator>(
    mut builder: MapBuilder<P>,
    period: Duration,
    trigger_rx: Receiver<Sender<Option<DrainReport>>>,
    shutdown_rx: Receiver<()>,
) -> MapBuilderStats {
    let shared = Arc::clone(builder.shared_state());
    let ticker = tick(period);
    info!("Map drain thread started (period {:?})", period);

    loop {
        if shared.is_shutdown_requested() {
            break;
        }

        select! {
            recv(ticker) -> _ => {
                drain_once(&mut builder, &shared);
            }
            recv(trigger_rx) -> msg => match msg {
                Ok(reply) => {
                    let report = drain_once(&mut builder, &shared);
                    let _ = reply.send(report);
                }
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => break,
        }
    }

    // Fold in whatever arrived before shutdown
    drain_once(&mut builder, &shared);

    let stats = builder.stats().clone();
    info!(
        "Map drain thread exiting. Stats: drains={}, clouds={}, skipped={}, indexed={}, unindexed={}",
        stats.drains,
        stats.clouds_processed,
        stats.clouds_skipped,
        stats.points_indexed,
        stats.points_unindexed
    );
    stats
}

/// Run one drain if the run-status flag is free.
fn drain_once<P: PoseIntegrator>(
    builder: &mut MapBuilder<P>,
    shared: &SharedState,
) -> Option<DrainReport> {
    if !shared.try_begin_drain() {
        debug!("Drain already active; skipping trigger");
        return None;
    }
    let report = builder.drain();
    shared.end_drain();
    Some(report)
}
