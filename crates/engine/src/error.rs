//! Errors surfaced by the monitor.

use thiserror::Error;
use watermon_dashboard::FetchError;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("User {0} is not an administrator")]
    Unauthorized(i64),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl MonitorError {
    /// Short reply for the chat that asked for a manual check.
    pub fn reply_text(&self) -> String {
        match self {
            MonitorError::Unauthorized(_) => "⛔ Access denied".to_string(),
            MonitorError::Fetch(e) if e.is_authentication() => {
                "🔐 Dashboard login failed".to_string()
            }
            MonitorError::Fetch(e) => format!("❌ Check failed: {}", e),
        }
    }
}
