//! Persisted poll cursor.
//!
//! The cursor is the only state carried between poll cycles: the id of the
//! newest sale seen and the keys of the alerts already notified.

use crate::{Alert, Sale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("Malformed cursor record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Change-detection cursor.
///
/// `last_sale_id` is `None` only before the first successful poll.
/// `last_alert_keys` holds exactly the alert urls active (and notified) at the
/// last successful poll, never the history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CursorRecord", into = "CursorRecord")]
pub struct Cursor {
    pub last_sale_id: Option<String>,
    pub last_alert_keys: BTreeSet<String>,
}

impl Cursor {
    /// True until the first snapshot with sales has been recorded.
    pub fn is_first_run(&self) -> bool {
        self.last_sale_id.is_none()
    }

    pub fn last_sale_id(&self) -> Option<&str> {
        self.last_sale_id.as_deref()
    }

    /// Move the sales cursor to the head of a newest-first snapshot.
    /// An empty snapshot leaves the cursor where it was.
    pub fn advance_sales(&mut self, current: &[Sale]) {
        if let Some(head) = current.first() {
            self.last_sale_id = Some(head.id.clone());
        }
    }

    /// Replace the notified set with the keys of the currently active alerts.
    pub fn replace_alert_keys(&mut self, keys: BTreeSet<String>) {
        self.last_alert_keys = keys;
    }

    pub fn has_notified(&self, alert: &Alert) -> bool {
        self.last_alert_keys.contains(alert.key())
    }

    /// Parse a stored record, migrating older layouts.
    pub fn from_json(text: &str) -> Result<Self, CursorError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, CursorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// On-disk layout.
///
/// Older files carry `last_notification_urls` for the alert keys and, before
/// that, a `last_sale_ids` history list instead of `last_sale_id`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CursorRecord {
    last_sale_id: Option<String>,
    #[serde(alias = "last_notification_urls")]
    last_alert_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    last_sale_ids: Vec<String>,
}

impl From<CursorRecord> for Cursor {
    fn from(record: CursorRecord) -> Self {
        let last_sale_id = match record.last_sale_id {
            Some(id) => Some(id),
            None => record.last_sale_ids.into_iter().next(),
        }
        .filter(|id| !id.is_empty());

        Self {
            last_sale_id,
            last_alert_keys: record.last_alert_keys.into_iter().collect(),
        }
    }
}

impl From<Cursor> for CursorRecord {
    fn from(cursor: Cursor) -> Self {
        Self {
            last_sale_id: Some(cursor.last_sale_id.unwrap_or_default()),
            last_alert_keys: cursor.last_alert_keys.into_iter().collect(),
            last_sale_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(urls: &[&str]) -> BTreeSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_default_is_first_run() {
        let cursor = Cursor::default();
        assert!(cursor.is_first_run());
        assert!(cursor.last_alert_keys.is_empty());
    }

    #[test]
    fn test_advance_sales_tracks_head() {
        let mut cursor = Cursor::default();
        cursor.advance_sales(&[Sale::new("105", "a", "t", "1", "1"), Sale::new("104", "a", "t", "1", "1")]);
        assert_eq!(cursor.last_sale_id(), Some("105"));

        cursor.advance_sales(&[]);
        assert_eq!(cursor.last_sale_id(), Some("105"));
    }

    #[test]
    fn test_serialized_layout() {
        let cursor = Cursor {
            last_sale_id: Some("105".to_string()),
            last_alert_keys: keys(&["https://x/terminal/2", "https://x/terminal/1"]),
        };
        let value: serde_json::Value = serde_json::from_str(&cursor.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "last_sale_id": "105",
                "last_alert_keys": ["https://x/terminal/1", "https://x/terminal/2"],
            })
        );
    }

    #[test]
    fn test_first_run_serializes_empty_id() {
        let json = Cursor::default().to_json().unwrap();
        let parsed = Cursor::from_json(&json).unwrap();
        assert!(parsed.is_first_run());
    }

    #[test]
    fn test_reads_previous_key_names() {
        let parsed = Cursor::from_json(
            r#"{"last_sale_id": "77", "last_notification_urls": ["https://x/terminal/9"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.last_sale_id(), Some("77"));
        assert_eq!(parsed.last_alert_keys, keys(&["https://x/terminal/9"]));
    }

    #[test]
    fn test_migrates_sale_id_history() {
        let parsed = Cursor::from_json(r#"{"last_sale_ids": ["90", "89", "88"]}"#).unwrap();
        assert_eq!(parsed.last_sale_id(), Some("90"));

        let empty_history = Cursor::from_json(r#"{"last_sale_ids": []}"#).unwrap();
        assert!(empty_history.is_first_run());
    }

    #[test]
    fn test_current_id_wins_over_history() {
        let parsed =
            Cursor::from_json(r#"{"last_sale_id": "91", "last_sale_ids": ["90"]}"#).unwrap();
        assert_eq!(parsed.last_sale_id(), Some("91"));
    }

    #[test]
    fn test_malformed_record() {
        assert!(Cursor::from_json("{not json").is_err());
        assert!(Cursor::from_json(r#"{"last_alert_keys": 5}"#).is_err());
    }
}
