// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Local event log
//!
//! Append-only file of serialized events, one JSON record per line, flushed
//! per record so a crash loses at most the event being written.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{info, warn};

/// Append-only log of dispatched events.
pub struct EventLog {
    file: Mutex<BufWriter<File>>,
}

impl EventLog {
    /// Open (or create) the event log at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Event log open at {:?}", path);

        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Record one serialized event. Write errors are logged, never fatal.
    pub fn record(&self, payload: &str) {
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{}", payload).and_then(|_| file.flush()) {
            warn!("Failed to write event log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let log = EventLog::open(&path).unwrap();
        log.record(r#"{"sequence":1}"#);
        log.record(r#"{"sequence":2}"#);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines, vec![r#"{"sequence":1}"#, r#"{"sequence":2}"#]);
    }

    #[test]
    fn test_open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.log");

        let log = EventLog::open(&path).unwrap();
        log.record("{}");

        assert!(path.exists());
    }
}
