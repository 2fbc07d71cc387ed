//! Bounded, most-recent-first activity log shown to the participant.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;

use crate::constants::ACTIVITY_LOG_CAP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    #[default]
    System,
    Attempt,
    Success,
    Hint,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time of the event as `HH:MM`.
    pub time: String,
    pub message: String,
    #[serde(alias = "type", default)]
    pub category: LogCategory,
}

/// Append-only log; entries beyond the cap fall off the old end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(transparent)]
pub struct ActivityLog(VecDeque<LogEntry>);

impl<'de> Deserialize<'de> for ActivityLog {
    /// Stored logs longer than the cap keep only their newest entries.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entries = VecDeque::<LogEntry>::deserialize(deserializer)?;
        entries.truncate(ACTIVITY_LOG_CAP);
        Ok(Self(entries))
    }
}

impl ActivityLog {
    #[must_use]
    pub const fn new() -> Self {
        Self(VecDeque::new())
    }

    pub fn record(
        &mut self,
        time: impl Into<String>,
        message: impl Into<String>,
        category: LogCategory,
    ) {
        self.0.push_front(LogEntry {
            time: time.into(),
            message: message.into(),
            category,
        });
        self.0.truncate(ACTIVITY_LOG_CAP);
    }

    /// Newest entry first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.0.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.0.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries carrying exactly this message.
    #[must_use]
    pub fn count_message(&self, message: &str) -> usize {
        self.0.iter().filter(|entry| entry.message == message).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first() {
        let mut log = ActivityLog::new();
        log.record("10:00", "first", LogCategory::System);
        log.record("10:01", "second", LogCategory::Success);
        assert_eq!(log.latest().map(|e| e.message.as_str()), Some("second"));
        let messages: Vec<_> = log.iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[test]
    fn oldest_entries_drop_beyond_cap() {
        let mut log = ActivityLog::new();
        for i in 0..20 {
            log.record("09:00", format!("event {i}"), LogCategory::Hint);
        }
        assert_eq!(log.len(), ACTIVITY_LOG_CAP);
        assert_eq!(log.latest().unwrap().message, "event 19");
        assert_eq!(log.iter().last().unwrap().message, "event 8");
        assert_eq!(log.count_message("event 0"), 0);
    }

    #[test]
    fn entries_serialize_with_category_and_accept_legacy_type_tag() {
        let mut log = ActivityLog::new();
        log.record("12:34", "Phase 1 completed", LogCategory::Success);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "time": "12:34", "message": "Phase 1 completed", "category": "success" }])
        );
        let back: ActivityLog = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);

        let legacy: ActivityLog = serde_json::from_str(
            r#"[{ "time": "08:15", "message": "Phase 2 attempt", "type": "attempt" }]"#,
        )
        .unwrap();
        assert_eq!(legacy.latest().unwrap().category, LogCategory::Attempt);
    }

    #[test]
    fn oversized_stored_log_keeps_newest_entries() {
        let entries: Vec<_> = (0..20)
            .map(|i| serde_json::json!({ "time": "09:00", "message": format!("event {i}"), "category": "system" }))
            .collect();
        let log: ActivityLog = serde_json::from_value(serde_json::Value::Array(entries)).unwrap();
        assert_eq!(log.len(), ACTIVITY_LOG_CAP);
        assert_eq!(log.latest().unwrap().message, "event 0");
        assert_eq!(log.iter().last().unwrap().message, "event 11");
    }
}
