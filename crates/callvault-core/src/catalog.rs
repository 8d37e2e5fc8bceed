//! In-memory index of finalized recordings backing the history surface.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One finalized recording. Immutable once created.
///
/// Derived deterministically from a session on finalize, or reconstructed
/// by parsing a `<timestamp>_<phoneNumber>.<ext>` filename found in the
/// recording directory. Both derivations agree field for field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingRecord {
    /// Full path of the recording file.
    pub uri: String,
    /// Filename component of `uri`.
    pub file_name: String,
    /// Filename-encoded start timestamp (`2024-01-01T00-00-00-000Z`).
    pub timestamp: String,
    /// Number that was dialed for this recording.
    pub phone_number: String,
}

impl RecordingRecord {
    /// Reconstruct a record from a recording file path.
    ///
    /// Returns `None` for names that do not follow the
    /// `<timestamp>_<phoneNumber>.<ext>` convention.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let stem = path.file_stem()?.to_str()?;
        // An extension is part of the convention.
        path.extension()?.to_str()?;

        let (timestamp, phone_number) = stem.split_once('_')?;
        if timestamp.is_empty() || phone_number.is_empty() {
            return None;
        }

        Some(Self {
            uri: path.to_string_lossy().into_owned(),
            file_name: file_name.to_owned(),
            timestamp: timestamp.to_owned(),
            phone_number: phone_number.to_owned(),
        })
    }
}

/// In-memory list of known recordings.
///
/// The catalog does not own the files; callers that delete a recording
/// must remove it from both storage and the catalog together so no entry
/// dangles.
#[derive(Debug, Default)]
pub struct RecordingCatalog {
    records: Vec<RecordingRecord>,
}

impl RecordingCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// All known records, oldest first.
    pub fn records(&self) -> &[RecordingRecord] {
        &self.records
    }

    /// Number of cataloged recordings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no recordings.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a finalized recording.
    pub fn push(&mut self, record: RecordingRecord) {
        debug!(file = %record.file_name, "Recording cataloged");
        self.records.push(record);
    }

    /// Look up a record by its uri.
    pub fn get(&self, uri: &str) -> Option<&RecordingRecord> {
        self.records.iter().find(|r| r.uri == uri)
    }

    /// Remove the record with the given uri. Returns whether an entry
    /// was removed.
    pub fn remove(&mut self, uri: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.uri != uri);
        before != self.records.len()
    }

    /// Replace the catalog contents, e.g. from
    /// [`RecordingDirectory::list_existing`](crate::RecordingDirectory::list_existing).
    pub fn replace(&mut self, records: Vec<RecordingRecord>) {
        self.records = records;
    }
}
