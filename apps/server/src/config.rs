//! Application configuration.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use watermon_alerts::NotifierConfig;
use watermon_dashboard::DashboardConfig;
use watermon_engine::MonitorConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dashboard location and credentials.
    pub dashboard: DashboardConfig,
    /// Bot token and administrators.
    pub telegram: TelegramSettings,
    /// Poll cadence and notification settings.
    pub monitor: MonitorSettings,
    /// Cursor file.
    pub data_file: PathBuf,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dashboard: DashboardConfig::default(),
            telegram: TelegramSettings::default(),
            monitor: MonitorSettings::default(),
            data_file: PathBuf::from("data.json"),
            log_level: "info".to_string(),
        }
    }
}

/// Telegram bot settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub token: String,
    /// User ids allowed to run manual checks.
    pub admin_ids: Vec<i64>,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &"<redacted>")
            .field("admin_ids", &self.admin_ids)
            .finish()
    }
}

/// Monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Seconds between the end of one cycle and the start of the next.
    pub interval_secs: u64,
    /// Sales listed by a manual sales check.
    pub manual_sales_limit: usize,
    /// Hours east of UTC used when showing timestamps.
    pub utc_offset_hours: i32,
    pub notifications: NotifierConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            manual_sales_limit: 10,
            utc_offset_hours: 3,
            notifications: NotifierConfig::default(),
        }
    }
}

impl From<&MonitorSettings> for MonitorConfig {
    fn from(settings: &MonitorSettings) -> Self {
        MonitorConfig {
            interval: Duration::from_secs(settings.interval_secs),
            manual_sales_limit: settings.manual_sales_limit,
            notifier: settings.notifications.clone(),
            ..Default::default()
        }
    }
}

fn parse_list<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
) -> Result<Vec<T>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse().map_err(|_| ConfigError::InvalidValue {
                name,
                value: item.to_string(),
            })
        })
        .collect()
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Override settings from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override settings from `lookup`. Empty values are ignored. Without
    /// explicit chat ids, notifications go to the administrators.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DASHBOARD_URL") {
            self.dashboard.base_url = url;
        }
        if let Some(login) = get("LOGIN") {
            self.dashboard.login = login;
        }
        if let Some(password) = get("PASSWORD") {
            self.dashboard.password = password;
        }
        if let Some(token) = get("TELEGRAM_TOKEN") {
            self.telegram.token = token;
        }
        if let Some(ids) = get("TELEGRAM_ADMIN_IDS") {
            self.telegram.admin_ids = parse_list("TELEGRAM_ADMIN_IDS", &ids)?;
        }
        if let Some(ids) = get("TELEGRAM_CHAT_IDS") {
            let chat_ids: Vec<i64> = parse_list("TELEGRAM_CHAT_IDS", &ids)?;
            self.monitor.notifications.destinations =
                chat_ids.iter().map(i64::to_string).collect();
        }

        if self.monitor.notifications.destinations.is_empty() {
            self.monitor.notifications.destinations =
                self.telegram.admin_ids.iter().map(i64::to_string).collect();
        }
        Ok(())
    }

    /// Settings the process cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.token.is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_TOKEN"));
        }
        if !self.dashboard.has_credentials() {
            return Err(ConfigError::Missing("LOGIN / PASSWORD"));
        }
        if self.telegram.admin_ids.is_empty() {
            return Err(ConfigError::Missing("TELEGRAM_ADMIN_IDS"));
        }
        if self.monitor.notifications.destinations.is_empty() {
            warn!("No notification destinations configured");
        }
        Ok(())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            admin_ids: self.telegram.admin_ids.clone(),
            ..MonitorConfig::from(&self.monitor)
        }
    }

    /// Zone for timestamps shown to users. An out-of-range offset falls
    /// back to UTC.
    pub fn display_offset(&self) -> FixedOffset {
        let hours = self.monitor.utc_offset_hours;
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                warn!(hours, "Invalid UTC offset, showing times in UTC");
                Utc.fix()
            })
    }

    pub fn log_summary(&self) {
        info!("  Dashboard: {}", self.dashboard.base_url);
        info!("  Interval: {} seconds", self.monitor.interval_secs);
        info!("  Administrators: {}", self.telegram.admin_ids.len());
        info!(
            "  Destinations: {}",
            self.monitor.notifications.destinations.len()
        );
        info!("  Data file: {}", self.data_file.display());
    }
}
