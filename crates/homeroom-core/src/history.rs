// Local practice history, kept as one pretty-printed JSON object on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::level::Level;

/// Format used for `SessionRecord::timestamp` and chat entry timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One graded answer as stored in `history.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub q: String,
    /// What the student typed, if it parsed as a number.
    pub ans: Option<f64>,
    pub correct: f64,
}

/// A completed practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub score: u32,
    pub total: u32,
    pub timestamp: String,
    #[serde(default)]
    pub results: Vec<AnswerRecord>,
}

/// The full contents of `history.json`, keyed by `user_level_date`.
pub type History = BTreeMap<String, SessionRecord>;

/// Builds the `history.json` key for a session, e.g. `ella_P2_2025-01-31`.
pub fn history_key(user: &str, level: Level, date: NaiveDate) -> String {
    format!(
        "{}_{}_{}",
        user.trim().to_lowercase(),
        level.code(),
        date.format("%Y-%m-%d")
    )
}

/// Reads and writes the history file. Every write replaces the whole file;
/// there is no locking.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        HistoryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history. A missing or unreadable file yields an empty map.
    pub fn load(&self) -> History {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no history file at {}", self.path.display());
                return History::new();
            }
            Err(e) => {
                warn!("failed to read {}: {e}", self.path.display());
                return History::new();
            }
        };
        match serde_json::from_str(&text) {
            Ok(history) => history,
            Err(e) => {
                warn!("ignoring invalid history file {}: {e}", self.path.display());
                History::new()
            }
        }
    }

    pub fn save(&self, history: &History) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(history).context("failed to serialize history")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Insert (or overwrite) the session for `user`/`level`/`date` and write
    /// the file back.
    pub fn record(
        &self,
        user: &str,
        level: Level,
        date: NaiveDate,
        record: SessionRecord,
    ) -> anyhow::Result<String> {
        let key = history_key(user, level, date);
        let mut history = self.load();
        history.insert(key.clone(), record);
        self.save(&history)?;
        Ok(key)
    }

    /// Sessions belonging to `user`, most recent first.
    pub fn sessions_for(&self, user: &str) -> Vec<(String, SessionRecord)> {
        let prefix = format!("{}_", user.trim().to_lowercase());
        let mut sessions: Vec<(String, SessionRecord)> = self
            .load()
            .into_iter()
            .filter(|(key, _)| key.starts_with(&prefix) && owns_key(&prefix, key))
            .collect();
        sessions.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        sessions
    }
}

/// True when the part of `key` after `prefix` is exactly `LEVEL_DATE`, so
/// user `a` does not pick up the sessions of a user named `a_b`.
fn owns_key(prefix: &str, key: &str) -> bool {
    let rest = &key[prefix.len()..];
    match rest.split_once('_') {
        Some((level, date)) => level.parse::<Level>().is_ok() && !date.contains('_'),
        None => false,
    }
}
