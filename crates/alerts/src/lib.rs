//! Notifications for the dashboard monitor.
//!
//! This crate provides:
//! - Message formatting and size-limited batching
//! - Telegram delivery and fan-out to every destination
//! - File-backed cursor persistence

pub mod batch;
pub mod config;
pub mod format;
pub mod notifier;
pub mod store;
pub mod telegram;

pub use batch::{Batcher, LengthUnit};
pub use config::NotifierConfig;
pub use notifier::{DeliveryReport, NotificationChannel, Notifier, NotifyError};
pub use store::{CursorStore, StoreError};
pub use telegram::TelegramBot;
