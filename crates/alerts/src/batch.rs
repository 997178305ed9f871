//! Packing rendered records into size-limited messages.

use serde::{Deserialize, Serialize};

/// How the transport counts message length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Bytes,
    #[default]
    Chars,
}

impl LengthUnit {
    #[inline]
    pub fn measure(self, text: &str) -> usize {
        match self {
            LengthUnit::Bytes => text.len(),
            LengthUnit::Chars => text.chars().count(),
        }
    }
}

/// Greedy message packer.
///
/// Rendered blocks are appended whole; a block is never split across two
/// messages. Every message stays within `max_len` except when one block is
/// longer than `max_len` by itself: that block goes out alone, oversized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    pub max_len: usize,
    /// Headroom kept free while packing blocks.
    pub safety_margin: usize,
    pub unit: LengthUnit,
}

impl Default for Batcher {
    fn default() -> Self {
        Self {
            max_len: 4096,
            safety_margin: 100,
            unit: LengthUnit::Chars,
        }
    }
}

impl Batcher {
    pub fn new(max_len: usize, safety_margin: usize) -> Self {
        Self {
            max_len,
            safety_margin,
            ..Default::default()
        }
    }

    pub fn with_unit(mut self, unit: LengthUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Pack `blocks` into messages. `header` opens the first message and
    /// stays with the first block whenever the two fit in `max_len`;
    /// `footer` closes the last one (or goes alone if it does not fit).
    pub fn batch<I>(&self, header: &str, blocks: I, footer: &str) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let len = |s: &str| self.unit.measure(s);
        let mut messages = Vec::new();
        let mut buffer = header.to_string();
        let mut has_blocks = false;

        for block in blocks {
            // The margin does not apply between the header and the first
            // block: the header leaves alone only if the pair exceeds the limit.
            let margin = if has_blocks { self.safety_margin } else { 0 };
            let projected = len(&buffer) + len(&block) + margin;
            if projected > self.max_len && !buffer.is_empty() {
                messages.push(std::mem::take(&mut buffer));
            }
            buffer.push_str(&block);
            has_blocks = true;
        }

        if !footer.is_empty() {
            if !buffer.is_empty() && len(&buffer) + len(footer) > self.max_len {
                messages.push(std::mem::take(&mut buffer));
            }
            buffer.push_str(footer);
        }

        if !buffer.is_empty() {
            messages.push(buffer);
        }
        messages
    }
}
