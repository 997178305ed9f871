//! Terminal fault alerts.

use serde::{Deserialize, Serialize};

/// A terminal currently flagged with a warning on the terminals page.
///
/// `url` is the natural key; `terminal_id` is display text only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alert {
    pub terminal_id: String,
    pub url: String,
}

impl Alert {
    pub fn new(terminal_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            terminal_id: terminal_id.into(),
            url: url.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.url
    }

    pub fn is_well_formed(&self) -> bool {
        !self.url.trim().is_empty()
    }
}
