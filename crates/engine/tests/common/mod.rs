//! In-memory fakes for the monitor's seams.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use watermon_alerts::{CursorStore, NotificationChannel, NotifierConfig, NotifyError};
use watermon_core::{Alert, Sale};
use watermon_dashboard::{FetchError, PageFetcher, Snapshot};
use watermon_engine::{Monitor, MonitorConfig};

pub const ADMIN: i64 = 1;
pub const STRANGER: i64 = 666;

/// Serves a settable snapshot and tracks how often and how concurrently it
/// is hit.
#[derive(Default)]
pub struct FakeFetcher {
    snapshot: Mutex<Snapshot>,
    failing: AtomicBool,
    delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn set(&self, sales: Vec<Sale>, alerts: Vec<Alert>) {
        *self.snapshot.lock().unwrap() = Snapshot { sales, alerts };
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            Err(FetchError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_sales(&self) -> Result<Vec<Sale>, FetchError> {
        self.enter().await?;
        Ok(self.snapshot.lock().unwrap().sales.clone())
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>, FetchError> {
        self.enter().await?;
        Ok(self.snapshot.lock().unwrap().alerts.clone())
    }
}

/// Records every delivered message; optionally rejects everything.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingChannel {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Texts delivered to one destination, in order.
    pub fn texts_for(&self, destination: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| d == destination)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Failed("chat not found".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub monitor: Arc<Monitor>,
    pub fetcher: Arc<FakeFetcher>,
    pub channel: Arc<RecordingChannel>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fetcher(FakeFetcher::default())
    }

    pub fn with_fetcher(fetcher: FakeFetcher) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(fetcher);
        let channel = Arc::new(RecordingChannel::default());
        let config = MonitorConfig {
            admin_ids: vec![ADMIN],
            interval: Duration::from_millis(20),
            manual_sales_limit: 10,
            notifier: NotifierConfig {
                destinations: vec!["100".to_string(), "200".to_string()],
                part_delay_ms: 0,
                ..Default::default()
            },
        };
        let monitor = Monitor::new(
            config,
            fetcher.clone(),
            channel.clone(),
            CursorStore::new(dir.path().join("data.json")),
        );

        Self {
            monitor: Arc::new(monitor),
            fetcher,
            channel,
            dir,
        }
    }

    pub fn store(&self) -> &CursorStore {
        self.monitor.store()
    }
}

pub fn sale(id: &str) -> Sale {
    Sale::new(id, "Lenina 1", "14:05:33", "19", "95")
}

/// Newest-first sales with ids from `newest` down to `oldest`.
pub fn sales(newest: u32, oldest: u32) -> Vec<Sale> {
    (oldest..=newest).rev().map(|id| sale(&id.to_string())).collect()
}

pub fn alert(n: u32) -> Alert {
    Alert::new(format!("T-{}", n), format!("https://my.alivewater.cloud/terminal/{}", n))
}
