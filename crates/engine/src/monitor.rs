//! Poll-cycle orchestration.
//!
//! A cycle fetches both dashboard pages, diffs them against the stored
//! cursor, announces what is new and records the new cursor. Scheduled
//! cycles and manual checks share one pipeline lock, so at most one of them
//! touches the dashboard session or the cursor at a time.

use crate::{MonitorConfig, MonitorError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use watermon_alerts::format::{alert_messages, recent_sales_messages, sales_messages};
use watermon_alerts::{Batcher, CursorStore, DeliveryReport, NotificationChannel, Notifier};
use watermon_core::{diff_alerts, diff_sales, Alert, Sale};
use watermon_dashboard::{FetchError, PageFetcher};

/// Stage of the pipeline currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Diffing,
    Notifying,
    Persisting,
    /// The last run ended with a fetch error.
    Failed,
}

impl CyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Fetching => "fetching",
            CyclePhase::Diffing => "diffing",
            CyclePhase::Notifying => "notifying",
            CyclePhase::Persisting => "persisting",
            CyclePhase::Failed => "failed",
        }
    }
}

/// Outcome of one scheduled poll cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// The cursor had no sale id before this cycle.
    pub first_run: bool,
    pub new_sales: usize,
    pub new_alerts: usize,
    pub messages: usize,
    pub delivery: DeliveryReport,
    /// False when the cursor could not be written; the next cycle repeats
    /// this cycle's notifications.
    pub persisted: bool,
}

/// Outcome of a manual sales check.
#[derive(Debug, Clone, Default)]
pub struct SalesCheckReport {
    /// Sales visible on the dashboard.
    pub total: usize,
    /// Sales listed in the reply.
    pub shown: usize,
    pub delivery: DeliveryReport,
}

/// Outcome of a manual terminals check.
#[derive(Debug, Clone, Default)]
pub struct TerminalsCheckReport {
    /// Terminals flagged right now.
    pub active: usize,
    pub new_alerts: usize,
    pub delivery: DeliveryReport,
    pub persisted: bool,
}

/// Snapshot of the monitor for the status command.
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    pub phase: CyclePhase,
    pub last_check: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub interval: Duration,
    pub destinations: usize,
}

#[derive(Debug, Default)]
struct StatusState {
    phase: CyclePhase,
    last_check: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Drops records the dashboard rendered without an identity.
fn well_formed_sales(sales: Vec<Sale>) -> Vec<Sale> {
    let total = sales.len();
    let kept: Vec<Sale> = sales.into_iter().filter(Sale::is_well_formed).collect();
    if kept.len() < total {
        warn!(dropped = total - kept.len(), "Ignoring sales without an id");
    }
    kept
}

fn well_formed_alerts(alerts: Vec<Alert>) -> Vec<Alert> {
    let total = alerts.len();
    let kept: Vec<Alert> = alerts.into_iter().filter(Alert::is_well_formed).collect();
    if kept.len() < total {
        warn!(dropped = total - kept.len(), "Ignoring alerts without a link");
    }
    kept
}

/// Dashboard monitor.
pub struct Monitor {
    config: MonitorConfig,
    fetcher: Arc<dyn PageFetcher>,
    notifier: Notifier,
    store: CursorStore,
    batcher: Batcher,
    /// Held for the whole of every cycle and manual check.
    pipeline: Mutex<()>,
    status: RwLock<StatusState>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        fetcher: Arc<dyn PageFetcher>,
        channel: Arc<dyn NotificationChannel>,
        store: CursorStore,
    ) -> Self {
        let notifier = Notifier::new(channel, config.notifier.destinations.clone())
            .with_part_delay(config.notifier.part_delay());
        let batcher = config.notifier.batcher();

        Self {
            config,
            fetcher,
            notifier,
            store,
            batcher,
            pipeline: Mutex::new(()),
            status: RwLock::new(StatusState::default()),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &CursorStore {
        &self.store
    }

    fn authorize(&self, requester: i64) -> Result<(), MonitorError> {
        if self.config.is_admin(requester) {
            Ok(())
        } else {
            warn!(user_id = requester, "Rejected request from non-administrator");
            Err(MonitorError::Unauthorized(requester))
        }
    }

    async fn set_phase(&self, phase: CyclePhase) {
        debug!(phase = phase.as_str(), "Pipeline phase");
        self.status.write().await.phase = phase;
    }

    async fn record_success(&self) {
        let mut status = self.status.write().await;
        status.phase = CyclePhase::Idle;
        status.last_check = Some(Utc::now());
        status.last_error = None;
    }

    async fn record_failure(&self, err: FetchError) -> MonitorError {
        error!(error = %err, "Dashboard fetch failed");
        let mut status = self.status.write().await;
        status.phase = CyclePhase::Failed;
        status.last_error = Some(err.to_string());
        MonitorError::Fetch(err)
    }

    /// Run one scheduled poll cycle.
    ///
    /// A fetch error ends the cycle before anything is sent or written.
    /// Delivery and persistence failures are logged and reported; they never
    /// fail the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, MonitorError> {
        let _pipeline = self.pipeline.lock().await;

        self.set_phase(CyclePhase::Fetching).await;
        let snapshot = match self.fetcher.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(self.record_failure(e).await),
        };

        self.set_phase(CyclePhase::Diffing).await;
        let sales = well_formed_sales(snapshot.sales);
        let alerts = well_formed_alerts(snapshot.alerts);
        let cursor = self.store.load().await;

        let new_sales = diff_sales(&sales, cursor.last_sale_id());
        let alert_diff = diff_alerts(&alerts, &cursor.last_alert_keys);

        if cursor.is_first_run() {
            info!(visible = sales.len(), "First run, recording current sales without notifying");
        }

        let mut next = cursor.clone();
        next.advance_sales(&sales);
        next.replace_alert_keys(alert_diff.updated_notified.clone());

        self.set_phase(CyclePhase::Notifying).await;
        let mut messages = sales_messages(
            new_sales,
            self.config.notifier.sales_display_cap,
            &self.batcher,
        );
        messages.extend(alert_messages(&alert_diff.new_alerts, &self.batcher));
        let delivery = self.notifier.deliver(&messages).await;

        self.set_phase(CyclePhase::Persisting).await;
        let persisted = match self.store.save(&next).await {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.store.path().display(), error = %e, "Failed to save cursor");
                false
            }
        };

        self.record_success().await;

        let report = CycleReport {
            first_run: cursor.is_first_run(),
            new_sales: new_sales.len(),
            new_alerts: alert_diff.new_alerts.len(),
            messages: messages.len(),
            delivery,
            persisted,
        };
        info!(
            new_sales = report.new_sales,
            new_alerts = report.new_alerts,
            active_alerts = alerts.len(),
            messages = report.messages,
            failed = report.delivery.failed,
            "Poll cycle complete"
        );
        Ok(report)
    }

    /// List the most recent sales to every destination on request.
    ///
    /// The sales cursor is left untouched, so the next scheduled cycle still
    /// announces these sales if it has not yet done so.
    pub async fn trigger_sales_check(
        &self,
        requester: i64,
    ) -> Result<SalesCheckReport, MonitorError> {
        self.authorize(requester)?;
        let _pipeline = self.pipeline.lock().await;
        info!(user_id = requester, "Manual sales check");

        self.set_phase(CyclePhase::Fetching).await;
        let sales = match self.fetcher.fetch_sales().await {
            Ok(sales) => well_formed_sales(sales),
            Err(e) => return Err(self.record_failure(e).await),
        };

        self.set_phase(CyclePhase::Notifying).await;
        let recent = &sales[..sales.len().min(self.config.manual_sales_limit)];
        let messages = recent_sales_messages(recent, &self.batcher);
        let delivery = self.notifier.deliver(&messages).await;

        self.record_success().await;
        Ok(SalesCheckReport {
            total: sales.len(),
            shown: recent.len(),
            delivery,
        })
    }

    /// Diff terminal alerts on request and announce the new ones.
    ///
    /// Only the alert half of the cursor is written.
    pub async fn trigger_terminals_check(
        &self,
        requester: i64,
    ) -> Result<TerminalsCheckReport, MonitorError> {
        self.authorize(requester)?;
        let _pipeline = self.pipeline.lock().await;
        info!(user_id = requester, "Manual terminals check");

        self.set_phase(CyclePhase::Fetching).await;
        let alerts = match self.fetcher.fetch_alerts().await {
            Ok(alerts) => well_formed_alerts(alerts),
            Err(e) => return Err(self.record_failure(e).await),
        };

        self.set_phase(CyclePhase::Diffing).await;
        let cursor = self.store.load().await;
        let alert_diff = diff_alerts(&alerts, &cursor.last_alert_keys);

        self.set_phase(CyclePhase::Notifying).await;
        let messages = alert_messages(&alert_diff.new_alerts, &self.batcher);
        let delivery = self.notifier.deliver(&messages).await;

        self.set_phase(CyclePhase::Persisting).await;
        let keys = alert_diff.updated_notified;
        let persisted = match self.store.update(|c| c.replace_alert_keys(keys)).await {
            Ok(_) => true,
            Err(e) => {
                error!(path = %self.store.path().display(), error = %e, "Failed to save cursor");
                false
            }
        };

        self.record_success().await;
        Ok(TerminalsCheckReport {
            active: alerts.len(),
            new_alerts: alert_diff.new_alerts.len(),
            delivery,
            persisted,
        })
    }

    pub async fn status(&self, requester: i64) -> Result<MonitorStatus, MonitorError> {
        self.authorize(requester)?;
        let status = self.status.read().await;
        Ok(MonitorStatus {
            phase: status.phase,
            last_check: status.last_check,
            last_error: status.last_error.clone(),
            interval: self.config.interval,
            destinations: self.notifier.destinations().len(),
        })
    }
}
