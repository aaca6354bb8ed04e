//! Alert history store.
//!
//! File format is a single JSON object keyed by ticker:
//!
//! ```json
//! { "AAPL": { "last_sent_at": "2025-01-10T23:59:00Z" } }
//! ```
//!
//! Entries are decoded lazily so that one damaged entry is reported as
//! [`HistoryEntry::Corrupted`] without affecting the others. A file that is
//! not a JSON object at all is treated as empty. Writes replace the whole
//! file through a temp file and rename; memory is updated only once the
//! file is in place.

use crate::error::PersistenceResult;
use chrono::{DateTime, Utc};
use pricewatch_core::{AlertRecord, HistoryEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Keyed read-one / write-one access to alert history.
pub trait AlertHistoryStore: Send {
    /// Look up a ticker. Unknown tickers are [`HistoryEntry::Absent`].
    fn get(&self, ticker: &str) -> HistoryEntry;

    /// Create or overwrite the record for `record.ticker`.
    fn put(&mut self, record: AlertRecord) -> PersistenceResult<()>;
}

/// On-disk shape of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    last_sent_at: DateTime<Utc>,
}

/// JSON file backed history store.
pub struct JsonHistoryStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonHistoryStore {
    /// Open the store at `path`. A missing or unparsable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    warn!(path = %path.display(), "Alert history is not a JSON object, starting empty");
                    Map::new()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Alert history unparsable, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No alert history yet");
                Map::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Alert history unreadable, starting empty");
                Map::new()
            }
        };

        info!(path = %path.display(), records = entries.len(), "Opened alert history");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_file(&self, entries: &Map<String, Value>) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl AlertHistoryStore for JsonHistoryStore {
    fn get(&self, ticker: &str) -> HistoryEntry {
        match self.entries.get(ticker) {
            None => HistoryEntry::Absent,
            Some(value) => match StoredRecord::deserialize(value) {
                Ok(stored) => HistoryEntry::Present(AlertRecord::new(ticker, stored.last_sent_at)),
                Err(e) => HistoryEntry::Corrupted(e.to_string()),
            },
        }
    }

    fn put(&mut self, record: AlertRecord) -> PersistenceResult<()> {
        let value = serde_json::to_value(StoredRecord {
            last_sent_at: record.last_sent_at,
        })?;
        let mut next = self.entries.clone();
        next.insert(record.ticker.clone(), value);
        self.write_file(&next)?;
        self.entries = next;

        debug!(
            ticker = %record.ticker,
            last_sent_at = %record.last_sent_at,
            "Alert history updated"
        );
        Ok(())
    }
}

/// In-memory history store.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: HashMap<String, HistoryEntry>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, including corrupted ones.
    pub fn insert(&mut self, ticker: impl Into<String>, entry: HistoryEntry) {
        self.entries.insert(ticker.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AlertHistoryStore for MemoryHistoryStore {
    fn get(&self, ticker: &str) -> HistoryEntry {
        self.entries
            .get(ticker)
            .cloned()
            .unwrap_or(HistoryEntry::Absent)
    }

    fn put(&mut self, record: AlertRecord) -> PersistenceResult<()> {
        self.entries
            .insert(record.ticker.clone(), HistoryEntry::Present(record));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, h, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonHistoryStore::open(dir.path().join("history.json"));
        assert!(store.is_empty());
        assert_eq!(store.get("AAPL"), HistoryEntry::Absent);
    }

    #[test]
    fn test_put_then_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("history.json");

        {
            let mut store = JsonHistoryStore::open(&path);
            store.put(AlertRecord::new("AAPL", at(9))).unwrap();
        }

        let store = JsonHistoryStore::open(&path);
        assert_eq!(
            store.get("AAPL"),
            HistoryEntry::Present(AlertRecord::new("AAPL", at(9)))
        );
        assert_eq!(store.get("MSFT"), HistoryEntry::Absent);
    }

    #[test]
    fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let mut store = JsonHistoryStore::open(&path);

        store.put(AlertRecord::new("AAPL", at(9))).unwrap();
        store.put(AlertRecord::new("AAPL", at(15))).unwrap();

        assert_eq!(store.len(), 1);
        let reopened = JsonHistoryStore::open(&path);
        assert_eq!(
            reopened.get("AAPL").record().map(|r| r.last_sent_at),
            Some(at(15))
        );
        assert!(!dir.path().join("history.json.tmp").exists());
    }

    #[test]
    fn test_corrupted_entry_isolated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"{"AAPL": {"last_sent_at": "yesterday-ish"}, "MSFT": {"last_sent_at": "2025-01-10T09:00:00Z"}}"#,
        )
        .unwrap();

        let mut store = JsonHistoryStore::open(&path);
        assert!(matches!(store.get("AAPL"), HistoryEntry::Corrupted(_)));
        assert_eq!(
            store.get("MSFT"),
            HistoryEntry::Present(AlertRecord::new("MSFT", at(9)))
        );

        // A fresh record replaces the corrupted one.
        store.put(AlertRecord::new("AAPL", at(10))).unwrap();
        assert_eq!(
            JsonHistoryStore::open(&path).get("AAPL"),
            HistoryEntry::Present(AlertRecord::new("AAPL", at(10)))
        );
    }

    #[test]
    fn test_unparsable_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[2025-01-10 09:00:00] AAPL alert").unwrap();

        let mut store = JsonHistoryStore::open(&path);
        assert!(store.is_empty());

        store.put(AlertRecord::new("AAPL", at(11))).unwrap();
        assert_eq!(JsonHistoryStore::open(&path).len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_entry_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();

        let mut store = JsonHistoryStore::open(blocker.join("history.json"));
        assert!(store.put(AlertRecord::new("AAPL", at(9))).is_err());
        assert_eq!(store.get("AAPL"), HistoryEntry::Absent);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryHistoryStore::new();
        assert_eq!(store.get("X"), HistoryEntry::Absent);

        store.insert("Y", HistoryEntry::Corrupted("bad".to_string()));
        assert!(matches!(store.get("Y"), HistoryEntry::Corrupted(_)));

        store.put(AlertRecord::new("Y", at(12))).unwrap();
        assert_eq!(store.get("Y"), HistoryEntry::Present(AlertRecord::new("Y", at(12))));
    }
}
