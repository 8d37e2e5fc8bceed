//! Recording directory management.
//!
//! Owns the on-device directory recordings are written into: creates it,
//! enumerates it back into [`RecordingRecord`]s, deletes by reference, and
//! computes output paths. Filenames encode `<timestamp>_<phoneNumber>.<ext>`
//! with the timestamp's `:` and `.` replaced by `-` so the name is valid on
//! every filesystem.

use crate::{RecorderError, RecordingRecord, error::Result};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Encode a timestamp for embedding in a recording filename.
///
/// RFC 3339 with millisecond precision, `:` and `.` replaced by `-`:
/// `2024-01-01T00:00:00.000Z` becomes `2024-01-01T00-00-00-000Z`.
pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Strip characters that cannot appear in a filename from a dialed number,
/// keeping the dial-pad alphabet. A number with no filename-safe characters
/// at all becomes `unknown`: an empty phone part would not survive the
/// filename codec, leaving the recording invisible to enumeration.
pub(crate) fn sanitize_number(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '*' | '#' | '-'))
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// The dedicated on-device directory holding finished recordings.
pub struct RecordingDirectory {
    root: PathBuf,
}

impl RecordingDirectory {
    /// Manager for the given directory. Nothing is touched on disk until
    /// [`ensure`](Self::ensure) is called.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory recordings are written into.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if absent. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::StorageUnavailable`] if creation is
    /// impossible (out of space, permission revoked).
    #[track_caller]
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| RecorderError::StorageUnavailable {
            reason: format!("Failed to create {:?}: {}", self.root, e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        debug!(directory = ?self.root, "Recording directory ready");
        Ok(())
    }

    /// Output path for a session: `<root>/<timestamp>_<number>.<ext>`.
    pub fn recording_path(
        &self,
        started_at: DateTime<Utc>,
        phone_number: &str,
        extension: &str,
    ) -> PathBuf {
        let file_name = format!(
            "{}_{}.{}",
            encode_timestamp(started_at),
            sanitize_number(phone_number),
            extension
        );
        self.root.join(file_name)
    }

    /// Parse the directory contents back into recording records.
    ///
    /// Malformed filenames (no `_` separator, no extension) are skipped
    /// with a debug log, not fatal: the directory may hold files written
    /// by other software.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::StorageUnavailable`] if the directory
    /// cannot be read.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn list_existing(&self) -> Result<Vec<RecordingRecord>> {
        let entries = fs::read_dir(&self.root).map_err(|e| RecorderError::StorageUnavailable {
            reason: format!("Failed to read {:?}: {}", self.root, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match RecordingRecord::from_path(&path) {
                Some(record) => records.push(record),
                None => debug!(path = ?path, "Skipping file with unrecognized name"),
            }
        }

        // Filenames sort chronologically because the timestamp leads.
        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        debug!(count = records.len(), "Enumerated recordings");

        Ok(records)
    }

    /// Remove a recording file. The caller is responsible for also
    /// removing the corresponding catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::NotFound`] if the file is absent, or
    /// [`RecorderError::StorageUnavailable`] for any other IO failure.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete(&self, uri: &str) -> Result<()> {
        let path = PathBuf::from(uri);

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = ?path, "Recording deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RecorderError::NotFound {
                path,
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(e) => Err(RecorderError::StorageUnavailable {
                reason: format!("Failed to delete {:?}: {}", path, e),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
