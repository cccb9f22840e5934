// Translate-chat log entries.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::history::TIMESTAMP_FORMAT;

/// One translated message in the shared chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub timestamp: String,
    pub original: String,
    pub english: String,
    pub myanmar: String,
}

impl ChatEntry {
    pub fn new(at: NaiveDateTime, original: &str, english: String, myanmar: String) -> Self {
        ChatEntry {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            original: original.to_string(),
            english,
            myanmar,
        }
    }

    /// History list label: `timestamp - first 50 chars...`.
    pub fn label(&self) -> String {
        let head: String = self.original.chars().take(50).collect();
        format!("{} - {}...", self.timestamp, head)
    }
}

/// Keep only the last `max` entries, preserving order.
pub fn keep_recent(entries: &mut Vec<ChatEntry>, max: usize) {
    if entries.len() > max {
        entries.drain(..entries.len() - max);
    }
}
