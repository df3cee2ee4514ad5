//! Persisted editing sessions.
//!
//! The session log keeps the ten most recently saved files, newest first,
//! one entry per file name. Each entry embeds everything needed to reopen
//! the file without re-importing it. Storage goes through the
//! [`SessionStore`] port so callers choose where the log lives.

use std::{
    cell::RefCell,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{filter::FilterSet, sheet::Sheet};

pub const SESSION_LIMIT: usize = 10;

/// Editor state captured for a session entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Names of every sheet in the source file.
    pub sheets: Vec<String>,
    pub active_sheet: usize,
    pub sheet: Sheet,
    pub filters: FilterSet,
    pub search_term: String,
    pub card_index: usize,
    pub card_view: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub sheet_count: usize,
    pub row_count: usize,
    pub state: SessionState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    entries: Vec<SessionEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` at the front, replacing any entry for the same file.
    pub fn record(&mut self, entry: SessionEntry) {
        self.entries
            .retain(|existing| existing.file_name != entry.file_name);
        self.entries.insert(0, entry);
        self.entries.truncate(SESSION_LIMIT);
    }

    pub fn latest(&self) -> Option<&SessionEntry> {
        self.entries.first()
    }

    pub fn find(&self, file_name: &str) -> Option<&SessionEntry> {
        self.entries
            .iter()
            .find(|entry| entry.file_name == file_name)
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Where the session log is kept.
pub trait SessionStore {
    fn load(&self) -> Result<SessionLog>;
    fn save(&self, log: &SessionLog) -> Result<()>;
}

/// Session log stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> Result<SessionLog> {
        if !self.path.exists() {
            debug!("No session log at {:?}", self.path);
            return Ok(SessionLog::new());
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Opening session log {:?}", self.path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing session log {:?}", self.path))
    }

    fn save(&self, log: &SessionLog) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating session directory {parent:?}"))?;
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Creating session log {:?}", self.path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, log)
            .with_context(|| format!("Writing session log {:?}", self.path))?;
        writer.flush()?;
        Ok(())
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    log: RefCell<SessionLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<SessionLog> {
        Ok(self.log.borrow().clone())
    }

    fn save(&self, log: &SessionLog) -> Result<()> {
        *self.log.borrow_mut() = log.clone();
        Ok(())
    }
}

const TIME_UNITS: &[(&str, i64)] = &[
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
];

/// Coarse relative age such as `3 hours ago`.
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();
    for (unit, unit_seconds) in TIME_UNITS {
        let count = seconds / unit_seconds;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{count} {unit}{plural} ago");
        }
    }
    "Just now".to_string()
}
