//! Append-only text log.
//!
//! Each line is `[YYYY-MM-DD HH:MM:SS] message`. The file is opened in append
//! mode for every write, so an interrupted process loses at most one line and
//! the log can be rotated externally at any time.

use crate::error::PersistenceResult;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamped line log (alert log, API log).
#[derive(Debug, Clone)]
pub struct LineLog {
    path: PathBuf,
}

impl LineLog {
    /// Create a log at `path`. Parent directories are created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` stamped with `at`, rendered in `at`'s own time zone.
    pub fn append_at<Tz>(&self, at: &DateTime<Tz>, message: &str) -> PersistenceResult<()>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "[{}] {}", at.format(TIMESTAMP_FORMAT), message)?;
        writer.flush()?;
        Ok(())
    }

    /// Like [`append_at`](Self::append_at), but failures are only logged.
    pub fn append_or_warn<Tz>(&self, at: &DateTime<Tz>, message: &str)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if let Err(e) = self.append_at(at, message) {
            warn!(path = %self.path.display(), error = %e, "Failed to append to log");
        }
    }
}
