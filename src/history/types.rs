use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Wire-shaped event record as reported by the sync engine.
///
/// Every field except `path` is optional; missing fields are normalized
/// by [`SyncEvent::from_raw`] rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub path: PathBuf,
    #[serde(default)]
    pub member: Option<String>,
    /// Byte count; absent means the file was deleted.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "last-updated")]
    pub last_updated: Option<f64>,
    #[serde(default)]
    pub mtime: Option<f64>,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            member: None,
            size: None,
            action: None,
            last_updated: None,
            mtime: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventAction {
    Added,
    Modified,
    Removed,
    Updated,
    Deleted,
}

impl EventAction {
    fn parse(action: Option<&str>) -> Self {
        match action.map(str::to_ascii_lowercase).as_deref() {
            Some("added") => Self::Added,
            Some("modified") => Self::Modified,
            Some("removed") => Self::Removed,
            _ => Self::Updated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Removed => "Removed",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized event as held by the history store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncEvent {
    pub path: PathBuf,
    pub member: Option<String>,
    pub size: u64,
    pub action: EventAction,
    /// Seconds since epoch; 0 when the record carried no time at all.
    pub timestamp: i64,
}

impl SyncEvent {
    /// Normalizes a raw record. Total: malformed or partial input is
    /// defaulted, never rejected.
    ///
    /// A missing `size` is the deletion marker and overrides any supplied
    /// action string. The timestamp prefers `last-updated` over `mtime`.
    pub fn from_raw(raw: RawEvent) -> Self {
        let (size, action) = match raw.size {
            None => (0, EventAction::Deleted),
            Some(size) => (size, EventAction::parse(raw.action.as_deref())),
        };
        let timestamp = raw
            .last_updated
            .or(raw.mtime)
            .map(|secs| secs as i64)
            .unwrap_or(0);
        Self {
            path: raw.path,
            member: raw.member,
            size,
            action,
            timestamp,
        }
    }

    /// Dedup key: one slot per (path, member) pair. Events without a
    /// member share the `None` slot for their path.
    pub fn key(&self) -> (&PathBuf, Option<&str>) {
        (&self.path, self.member.as_deref())
    }

    /// Final path component, for one-line displays.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_size_is_deletion_marker() {
        let mut raw = RawEvent::new("/folder/gone.txt");
        raw.action = Some("modified".to_string());
        let event = SyncEvent::from_raw(raw);
        assert_eq!(event.size, 0);
        assert_eq!(event.action, EventAction::Deleted);
    }

    #[test]
    fn test_action_defaults_to_updated() {
        let mut raw = RawEvent::new("/folder/file.txt");
        raw.size = Some(12);
        let event = SyncEvent::from_raw(raw);
        assert_eq!(event.action, EventAction::Updated);

        let mut raw = RawEvent::new("/folder/file.txt");
        raw.size = Some(12);
        raw.action = Some("garbage".to_string());
        assert_eq!(SyncEvent::from_raw(raw).action, EventAction::Updated);
    }

    #[test]
    fn test_action_parse_case_insensitive() {
        for (s, want) in [
            ("added", EventAction::Added),
            ("Modified", EventAction::Modified),
            ("REMOVED", EventAction::Removed),
        ] {
            let mut raw = RawEvent::new("/f");
            raw.size = Some(1);
            raw.action = Some(s.to_string());
            assert_eq!(SyncEvent::from_raw(raw).action, want);
        }
    }

    #[test]
    fn test_timestamp_prefers_last_updated() {
        let mut raw = RawEvent::new("/f");
        raw.size = Some(1);
        raw.last_updated = Some(100.9);
        raw.mtime = Some(50.0);
        assert_eq!(SyncEvent::from_raw(raw).timestamp, 100);

        let mut raw = RawEvent::new("/f");
        raw.size = Some(1);
        raw.mtime = Some(50.0);
        assert_eq!(SyncEvent::from_raw(raw).timestamp, 50);

        let mut raw = RawEvent::new("/f");
        raw.size = Some(1);
        assert_eq!(SyncEvent::from_raw(raw).timestamp, 0);
    }

    #[test]
    fn test_raw_event_json_shape() {
        let json = r#"{
            "path": "/magic/report.pdf",
            "member": "alice",
            "size": 2048,
            "action": "added",
            "last-updated": 1700000000.5
        }"#;
        let raw: RawEvent = serde_json::from_str(json).unwrap();
        let event = SyncEvent::from_raw(raw);
        assert_eq!(event.member.as_deref(), Some("alice"));
        assert_eq!(event.size, 2048);
        assert_eq!(event.action, EventAction::Added);
        assert_eq!(event.timestamp, 1700000000);
    }

    #[test]
    fn test_basename() {
        let mut raw = RawEvent::new("/magic/sub/report.pdf");
        raw.size = Some(1);
        assert_eq!(SyncEvent::from_raw(raw).basename(), "report.pdf");
    }
}
