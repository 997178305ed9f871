//! Fan-out of notification messages to every destination.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Message transport. One call delivers one text to one destination.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError>;
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    /// Destinations with at least one failed message.
    pub failed_destinations: Vec<String>,
}

impl DeliveryReport {
    pub fn merge(&mut self, other: DeliveryReport) {
        self.sent += other.sent;
        self.failed += other.failed;
        for destination in other.failed_destinations {
            if !self.failed_destinations.contains(&destination) {
                self.failed_destinations.push(destination);
            }
        }
    }

    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Sends message batches to a fixed list of destinations.
pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
    destinations: Vec<String>,
    part_delay: Duration,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>, destinations: Vec<String>) -> Self {
        Self {
            channel,
            destinations,
            part_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive messages to the same destination.
    pub fn with_part_delay(mut self, delay: Duration) -> Self {
        self.part_delay = delay;
        self
    }

    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    /// Deliver `messages` in order to every destination.
    ///
    /// Failures are logged and counted; they never stop delivery of the
    /// remaining messages or to the remaining destinations.
    pub async fn deliver(&self, messages: &[String]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if messages.is_empty() {
            return report;
        }

        for destination in &self.destinations {
            let mut failed_here = false;

            for (i, message) in messages.iter().enumerate() {
                if i > 0 && !self.part_delay.is_zero() {
                    tokio::time::sleep(self.part_delay).await;
                }

                match self.channel.send(destination, message).await {
                    Ok(()) => report.sent += 1,
                    Err(e) => {
                        error!(
                            chat_id = destination.as_str(),
                            part = i + 1,
                            parts = messages.len(),
                            error = %e,
                            "Failed to send notification"
                        );
                        report.failed += 1;
                        failed_here = true;
                    }
                }
            }

            if failed_here {
                report.failed_destinations.push(destination.clone());
            } else {
                info!(
                    chat_id = destination.as_str(),
                    parts = messages.len(),
                    "Notification sent"
                );
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records every send; fails for the listed destinations.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(String, String)>>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
            if self.failing.iter().any(|d| d == destination) {
                return Err(NotifyError::Failed("network unreachable".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn messages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_delivers_in_order_to_every_destination() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = Notifier::new(channel.clone(), vec!["1".into(), "2".into()]);

        let report = notifier.deliver(&messages(&["a", "b"])).await;

        assert_eq!(report.sent, 4);
        assert!(report.all_delivered());
        assert_eq!(
            *channel.sent.lock().unwrap(),
            vec![
                ("1".to_string(), "a".to_string()),
                ("1".to_string(), "b".to_string()),
                ("2".to_string(), "a".to_string()),
                ("2".to_string(), "b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_destination_does_not_block_others() {
        let channel = Arc::new(RecordingChannel {
            failing: vec!["1".to_string()],
            ..Default::default()
        });
        let notifier = Notifier::new(channel.clone(), vec!["1".into(), "2".into()]);

        let report = notifier.deliver(&messages(&["a", "b"])).await;

        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failed_destinations, vec!["1".to_string()]);
        assert_eq!(channel.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_nothing_to_deliver() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = Notifier::new(channel.clone(), vec!["1".into()]);
        assert_eq!(notifier.deliver(&[]).await, DeliveryReport::default());
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_part_delay_between_messages() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = Notifier::new(channel, vec!["1".into()])
            .with_part_delay(Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        notifier.deliver(&messages(&["a", "b", "c"])).await;
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_report_merge() {
        let mut report = DeliveryReport {
            sent: 1,
            failed: 1,
            failed_destinations: vec!["1".into()],
        };
        report.merge(DeliveryReport {
            sent: 2,
            failed: 1,
            failed_destinations: vec!["1".into()],
        });
        assert_eq!(report.sent, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failed_destinations, vec!["1".to_string()]);
    }
}
