//! Notification delivery configuration.

use crate::{Batcher, LengthUnit};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how notifications are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Chat ids that receive every notification.
    pub destinations: Vec<String>,
    /// Transport message size limit.
    pub max_message_len: usize,
    /// Headroom kept free while packing records into a message.
    pub safety_margin: usize,
    pub length_unit: LengthUnit,
    /// Maximum number of sales rendered in one notification.
    pub sales_display_cap: usize,
    /// Pause between consecutive messages to one destination.
    pub part_delay_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            destinations: Vec::new(),
            max_message_len: 4096,
            safety_margin: 100,
            length_unit: LengthUnit::Chars,
            sales_display_cap: 20,
            part_delay_ms: 1000,
        }
    }
}

impl NotifierConfig {
    pub fn batcher(&self) -> Batcher {
        Batcher::new(self.max_message_len, self.safety_margin).with_unit(self.length_unit)
    }

    pub fn part_delay(&self) -> Duration {
        Duration::from_millis(self.part_delay_ms)
    }
}
