//! Fixed-delay poll loop.

use crate::Monitor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run poll cycles forever, sleeping `interval` after each one completes.
///
/// A failed cycle is logged and retried at the next tick. The loop only ends
/// when its task is aborted.
pub async fn run_scheduler(monitor: Arc<Monitor>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "Starting monitoring loop");

    loop {
        match monitor.run_cycle().await {
            Ok(report) if !report.delivery.all_delivered() => {
                warn!(
                    failed = report.delivery.failed,
                    destinations = ?report.delivery.failed_destinations,
                    "Some notifications were not delivered"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, next_in_secs = interval.as_secs(), "Poll cycle failed");
            }
        }

        tokio::time::sleep(interval).await;
    }
}
