use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use log::{error, info};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::metrics::UpdateMetrics;
use crate::schema::{ReleaseList, Vendor};

use super::coordinator::ReleaseUpdater;

/// Handle to the background update loop.
///
/// Dropping the handle does NOT stop the loop, the schedule lives as long
/// as the runtime. `stop` is meant for process shutdown only; it aborts at
/// the next suspension point and offers no clean-cut guarantee for an
/// update in flight.
pub struct UpdateSchedule {
    handle: JoinHandle<()>,
}

impl UpdateSchedule {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// What one run over all vendors produced.
#[derive(Debug, Default)]
pub struct TickSummary {
    /// New releases per vendor that completed
    pub updated: BTreeMap<Vendor, ReleaseList>,

    /// Vendors whose update raised an error or panicked
    pub failed: Vec<Vendor>,
}

/// Starts the periodic update loop.
///
/// The first run starts immediately. Every following run starts `period`
/// after the previous one finished (fixed delay, not fixed rate), so a
/// slow vendor pushes the schedule back instead of overlapping runs.
///
/// GUARANTEES:
/// - The loop never exits voluntarily
/// - A failing vendor affects neither the other vendors of the run nor
///   later runs
///
pub fn schedule_updates(updater: Arc<ReleaseUpdater>, period: Duration) -> UpdateSchedule {
    info!("Scheduling release updates every {:?}", period);

    let handle = tokio::spawn(async move {
        loop {
            run_update(&updater).await;
            sleep(period).await;
        }
    });

    UpdateSchedule { handle }
}

/// Runs one update over every vendor, sequentially and in vendor order.
///
/// Errors and panics are caught per vendor and logged here; nothing
/// escapes this function.
pub async fn run_update(updater: &ReleaseUpdater) -> TickSummary {
    let started = Instant::now();
    let mut summary = TickSummary::default();

    for vendor in updater.vendors() {
        let outcome = AssertUnwindSafe(updater.update(vendor)).catch_unwind().await;

        match outcome {
            Ok(Ok(added)) => {
                for release in added.iter() {
                    info!("Added release: {}", release.release_name);
                }
                summary.updated.insert(vendor, added);
            }
            Ok(Err(e)) => {
                error!("Caught error while updating {}: {}", vendor, e);
                summary.failed.push(vendor);
            }
            Err(panic) => {
                error!(
                    "Caught panic while updating {}: {}",
                    vendor,
                    panic_message(panic.as_ref())
                );
                summary.failed.push(vendor);
            }
        }
    }

    let metrics = updater.metrics();
    UpdateMetrics::add(&metrics.vendor_failures, summary.failed.len());
    UpdateMetrics::incr(&metrics.ticks_completed);

    info!(
        "Update run finished in {:?}: {} vendors updated, {} failed",
        started.elapsed(),
        summary.updated.len(),
        summary.failed.len()
    );
    info!("{}", metrics.snapshot());

    summary
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
