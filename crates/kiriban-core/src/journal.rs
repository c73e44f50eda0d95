//! Append-only event log of session lifecycle events.
//!
//! This is observability, not persistence: nothing is ever read back, and a
//! write failure must never affect game state.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, Result};

const JOURNAL_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC.
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Clone, Debug, Serialize)]
pub struct GameEvent {
    pub timestamp: String,
    pub event: String,
    pub chat_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl GameEvent {
    fn base(event: &str, chat_id: i64) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            chat_id,
            user_id: None,
            topic: None,
            targets: None,
            target: None,
            author: None,
            content: None,
        }
    }

    pub fn session_started(chat_id: i64, user_id: i64, topic: &str, targets: &[u64]) -> Self {
        Self {
            user_id: Some(user_id),
            topic: Some(topic.to_string()),
            targets: Some(targets.to_vec()),
            ..Self::base("session_started", chat_id)
        }
    }

    pub fn target_hit(chat_id: i64, target: u64, author: &str, content: &str) -> Self {
        Self {
            target: Some(target),
            author: Some(author.to_string()),
            content: Some(content.to_string()),
            ..Self::base("target_hit", chat_id)
        }
    }

    pub fn session_completed(chat_id: i64, topic: &str, targets: &[u64]) -> Self {
        Self {
            topic: Some(topic.to_string()),
            targets: Some(targets.to_vec()),
            ..Self::base("session_completed", chat_id)
        }
    }

    pub fn session_stopped(chat_id: i64, user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::base("session_stopped", chat_id)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Journal {
    path: PathBuf,
    json: bool,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: GameEvent) -> Result<()> {
        if let Some(s) = &event.content {
            event.content = Some(crate::formatting::truncate_text(s, JOURNAL_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "journal event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.log"))
    }

    #[test]
    fn writes_json_lines() {
        let journal = Journal::new(tmp_file("kiriban-journal-test"), true);
        journal
            .write(GameEvent::session_started(1, 7, "pizza", &[10, 15]))
            .unwrap();
        journal
            .write(GameEvent::target_hit(1, 10, "alice", "here"))
            .unwrap();

        let written = std::fs::read_to_string(journal.path()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(
            first.get("event").and_then(|v| v.as_str()),
            Some("session_started")
        );
        assert_eq!(first.get("chat_id").and_then(|v| v.as_i64()), Some(1));
    }

    #[test]
    fn truncates_long_content() {
        let journal = Journal::new(tmp_file("kiriban-journal-trunc"), true);
        let content = "x".repeat(JOURNAL_MAX_TEXT + 20);
        journal
            .write(GameEvent::target_hit(1, 10, "alice", &content))
            .unwrap();

        let written = std::fs::read_to_string(journal.path()).unwrap();
        assert!(written.contains("..."));
        assert!(!written.contains(&content));
    }
}
