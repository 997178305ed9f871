//! Change detection between a fresh dashboard snapshot and the cursor.
//!
//! Both engines are pure: they borrow the snapshot and cursor fields and hand
//! back what is new together with the cursor values to persist.

use crate::{Alert, Sale};
use std::collections::BTreeSet;

/// Sales strictly newer than `last_sale_id`, newest first.
///
/// - first run (`None`): nothing is new, so a fresh install does not flood
///   the channel with the visible backlog.
/// - cursor found at index `i`: `current[..i]`.
/// - cursor not on the page: nothing is new. The sale scrolled out of the
///   visible window or the source was reset, and the gap cannot be recovered
///   from this data.
pub fn diff_sales<'a>(current: &'a [Sale], last_sale_id: Option<&str>) -> &'a [Sale] {
    let Some(last_id) = last_sale_id else {
        return &[];
    };

    match current.iter().position(|sale| sale.id == last_id) {
        Some(index) => &current[..index],
        None => &[],
    }
}

/// Result of comparing active alerts against the notified set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDiff {
    /// Alerts not notified before, ordered by url.
    pub new_alerts: Vec<Alert>,
    /// Urls of every currently active alert. Replaces the notified set.
    pub updated_notified: BTreeSet<String>,
}

impl AlertDiff {
    pub fn has_new(&self) -> bool {
        !self.new_alerts.is_empty()
    }
}

/// Split the active alerts into new ones and the next notified set.
///
/// The notified set is replaced, not merged, so an alert that clears and
/// later comes back is reported again. Duplicate urls collapse to the first
/// occurrence.
pub fn diff_alerts(current: &[Alert], previously_notified: &BTreeSet<String>) -> AlertDiff {
    let mut updated_notified = BTreeSet::new();
    let mut new_alerts = Vec::new();

    for alert in current {
        if !updated_notified.insert(alert.url.clone()) {
            continue;
        }
        if !previously_notified.contains(&alert.url) {
            new_alerts.push(alert.clone());
        }
    }

    new_alerts.sort_by(|a, b| a.url.cmp(&b.url));

    AlertDiff {
        new_alerts,
        updated_notified,
    }
}
