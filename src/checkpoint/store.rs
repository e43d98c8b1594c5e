//! Filesystem-backed cursor store.
//!
//! One directory per `(API credential, resource kind)` holds a pair of
//! files per checkpoint name:
//!
//! ```text
//! <config-root>/checkpoints/<api-client-id>/<resource>_checkpoints/<name>
//! <config-root>/checkpoints/<api-client-id>/<resource>_checkpoints/<name>_<event-key>
//! ```
//!
//! The first file is the checkpoint value (a float-seconds timestamp, or
//! a serialized query for token-paginated resources); the second is a
//! JSON array of seen identifiers. Every call round-trips to disk: the
//! tool is a single-shot CLI invocation per process, so there is nothing
//! to cache. Individual writes are atomic via write-to-temp-then-rename;
//! concurrent writers are not coordinated (single-operator tool,
//! last-writer-wins by design).

use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::CheckpointError;

/// Resource kinds that support checkpointed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Alerts
    Alert,
    /// Audit log events
    AuditLog,
    /// File events
    FileEvent,
}

impl ResourceKind {
    /// Directory-name component for this resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Alert => "alert",
            ResourceKind::AuditLog => "audit_log",
            ResourceKind::FileEvent => "file_event",
        }
    }

    /// Suffix distinguishing seen-set files from value files.
    pub fn event_key(&self) -> &'static str {
        match self {
            ResourceKind::Alert => "alerts",
            ResourceKind::AuditLog => "audit_events",
            ResourceKind::FileEvent => "file_events",
        }
    }
}

/// A stored checkpoint, as returned by [`CursorStore::list_all`].
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// User-chosen checkpoint name
    pub name: String,
    /// Parsed checkpoint value
    pub value: CheckpointValue,
}

/// The two kinds of checkpoint value.
///
/// Timestamp checkpoints resume by re-filtering from the high-water
/// mark; query-state checkpoints resume by replaying the stored query
/// (page token included) wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointValue {
    /// High-water-mark timestamp (alerts, audit log)
    Timestamp(DateTime<Utc>),
    /// Serialized query JSON (file events)
    QueryState(String),
}

impl CheckpointValue {
    /// Parse a raw stored value.
    ///
    /// Query-state values are JSON objects; anything else must be a
    /// float-seconds timestamp.
    pub fn parse(raw: &str) -> Result<Self, CheckpointError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            Ok(CheckpointValue::QueryState(trimmed.to_string()))
        } else {
            Ok(CheckpointValue::Timestamp(Self::parse_timestamp(trimmed)?))
        }
    }

    /// Parse a float-seconds timestamp value.
    pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CheckpointError> {
        let seconds: f64 = raw.trim().parse().map_err(|_| {
            CheckpointError::InvalidValue(format!("not a float timestamp: {raw:?}"))
        })?;
        let micros = (seconds * 1_000_000.0).round() as i64;
        DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            CheckpointError::InvalidValue(format!("timestamp out of range: {raw:?}"))
        })
    }

    /// Format a timestamp the way it is persisted: Unix seconds with
    /// microsecond precision.
    pub fn format_timestamp(ts: DateTime<Utc>) -> String {
        format!("{:.6}", ts.timestamp_micros() as f64 / 1_000_000.0)
    }
}

impl std::fmt::Display for CheckpointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            CheckpointValue::QueryState(_) => write!(f, "<stored query>"),
        }
    }
}

/// Durable key-value persistence for checkpoint state.
#[derive(Debug, Clone)]
pub struct CursorStore {
    dir: PathBuf,
    event_key: &'static str,
}

impl CursorStore {
    /// Create a store scoped to one credential and resource kind.
    ///
    /// The directory is created lazily on first write.
    pub fn new(config_root: &Path, api_client_id: &str, kind: ResourceKind) -> Self {
        let dir = config_root
            .join("checkpoints")
            .join(api_client_id)
            .join(format!("{}_checkpoints", kind.as_str()));
        Self {
            dir,
            event_key: kind.event_key(),
        }
    }

    fn value_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn items_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}_{}", self.event_key))
    }

    /// Read the raw checkpoint value, or `None` on a first run.
    pub fn get(&self, name: &str) -> Result<Option<String>, CheckpointError> {
        match fs::read_to_string(self.value_path(name)) {
            Ok(raw) => Ok(Some(raw.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically overwrite the checkpoint value.
    pub fn replace(&self, name: &str, value: &str) -> Result<(), CheckpointError> {
        self.write_atomic(&self.value_path(name), value)
    }

    /// Remove the checkpoint value and its paired seen-set.
    ///
    /// An unknown name is [`CheckpointError::NotFound`], not a silent
    /// no-op: this backs a user-facing command where a typo should be
    /// visible. A missing seen-set file alongside an existing value is
    /// not an error.
    pub fn delete(&self, name: &str) -> Result<(), CheckpointError> {
        match fs::remove_file(self.value_path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        match fs::remove_file(self.items_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the seen-identifier list for `name`.
    ///
    /// Absent or unparseable content yields an empty list: the seen-set
    /// is a best-effort dedup window, not a correctness-critical ledger,
    /// so a corrupt or partially written file means "start fresh".
    pub fn get_items(&self, name: &str) -> Result<Vec<String>, CheckpointError> {
        let path = self.items_path(name);
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => Ok(items),
                Err(e) => {
                    debug!(
                        path = %path.display(),
                        error = %e,
                        "Seen-set file unparseable; treating as empty"
                    );
                    Ok(Vec::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically overwrite the seen-identifier list.
    pub fn replace_items(&self, name: &str, items: &[String]) -> Result<(), CheckpointError> {
        let json = serde_json::to_string(items)?;
        self.write_atomic(&self.items_path(name), &json)
    }

    /// Enumerate all checkpoints in this scope.
    ///
    /// Seen-set companion files are excluded; a value file that cannot
    /// be parsed is skipped with a warning rather than failing the
    /// listing.
    pub fn list_all(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let suffix = format!("_{}", self.event_key);
        let mut checkpoints = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if name.ends_with(&suffix) {
                continue;
            }

            let raw = fs::read_to_string(entry.path())?;
            match CheckpointValue::parse(&raw) {
                Ok(value) => checkpoints.push(Checkpoint {
                    name: name.into_owned(),
                    value,
                }),
                Err(e) => {
                    warn!(name = %name, error = %e, "Skipping unreadable checkpoint");
                }
            }
        }

        checkpoints.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(checkpoints)
    }

    /// Write contents to a temp file in the store directory and rename
    /// it over the target, so an interrupted call never leaves a
    /// half-written file behind.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir)?;

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| CheckpointError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CursorStore {
        CursorStore::new(dir.path(), "client-1", ResourceKind::Alert)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store(&dir).get("nope").unwrap(), None);
    }

    #[test]
    fn test_replace_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.replace("daily", "1714564800.000000").unwrap();
        assert_eq!(s.get("daily").unwrap().as_deref(), Some("1714564800.000000"));

        s.replace("daily", "1714564801.500000").unwrap();
        assert_eq!(s.get("daily").unwrap().as_deref(), Some("1714564801.500000"));
    }

    #[test]
    fn test_items_default_to_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).get_items("daily").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_items_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.replace("daily", "1.0").unwrap();
        // Simulate a partial write of the seen-set file.
        std::fs::write(s.items_path("daily"), "[\"a\", \"b").unwrap();
        assert!(s.get_items("daily").unwrap().is_empty());
    }

    #[test]
    fn test_items_round_trip() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let items = vec!["a-1".to_string(), "a-2".to_string()];
        s.replace_items("daily", &items).unwrap();
        assert_eq!(s.get_items("daily").unwrap(), items);
    }

    #[test]
    fn test_delete_unknown_name_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = store(&dir).delete("typo");
        assert!(matches!(
            result,
            Err(CheckpointError::NotFound { name }) if name == "typo"
        ));
    }

    #[test]
    fn test_delete_removes_both_files() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.replace("daily", "1.0").unwrap();
        s.replace_items("daily", &["a-1".to_string()]).unwrap();

        s.delete("daily").unwrap();
        assert_eq!(s.get("daily").unwrap(), None);
        assert!(s.get_items("daily").unwrap().is_empty());
    }

    #[test]
    fn test_list_all_excludes_seen_set_files() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.replace("daily", "1714564800.000000").unwrap();
        s.replace_items("daily", &["a-1".to_string()]).unwrap();
        s.replace("weekly", "1714564900.250000").unwrap();

        let all = s.list_all().unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["daily", "weekly"]);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let dir = TempDir::new().unwrap();
        let alerts = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
        let audit = CursorStore::new(dir.path(), "client-1", ResourceKind::AuditLog);
        let other_client = CursorStore::new(dir.path(), "client-2", ResourceKind::Alert);

        alerts.replace("daily", "1.0").unwrap();
        assert_eq!(audit.get("daily").unwrap(), None);
        assert_eq!(other_client.get("daily").unwrap(), None);
    }

    #[test]
    fn test_timestamp_value_round_trips_with_microseconds() {
        let ts = DateTime::from_timestamp_micros(1_714_564_800_123_456).unwrap();
        let raw = CheckpointValue::format_timestamp(ts);
        let parsed = CheckpointValue::parse_timestamp(&raw).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn test_value_parse_distinguishes_kinds() {
        assert!(matches!(
            CheckpointValue::parse("1714564800.5").unwrap(),
            CheckpointValue::Timestamp(_)
        ));
        assert!(matches!(
            CheckpointValue::parse("{\"pageSize\":500}").unwrap(),
            CheckpointValue::QueryState(_)
        ));
        assert!(CheckpointValue::parse("garbage").is_err());
    }
}
