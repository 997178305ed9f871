//! Monitor configuration.

use std::time::Duration;
use watermon_alerts::NotifierConfig;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Telegram user ids allowed to trigger manual checks.
    pub admin_ids: Vec<i64>,
    /// Pause between the end of one poll cycle and the start of the next.
    pub interval: Duration,
    /// Sales listed by a manual sales check.
    pub manual_sales_limit: usize,
    pub notifier: NotifierConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            interval: Duration::from_secs(300),
            manual_sales_limit: 10,
            notifier: NotifierConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.manual_sales_limit, 10);
        assert!(!config.is_admin(1));
    }
}
