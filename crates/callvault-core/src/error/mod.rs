use crate::permissions::Capability;

use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Call-recording errors with source location tracking.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// A capability required for recording was denied by the platform.
    #[error("Permission denied for {capability} {location}")]
    PermissionDenied {
        /// The capability that was denied.
        capability: Capability,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A session is already in flight; the controller enforces
    /// single-session exclusivity.
    #[error("A recording session is already active {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture handle could not be opened.
    #[error("Failed to start recording: {reason} {location}")]
    RecordingStartFailed {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The finalized recording captured no audio or the output file
    /// vanished. Recoverable: the session is simply lost.
    #[error("Recording empty or missing at {path:?} {location}")]
    RecordingEmptyOrMissing {
        /// Path the recording was expected at.
        path: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recordings directory could not be created or read.
    #[error("Storage unavailable: {reason} {location}")]
    StorageUnavailable {
        /// Description of the storage failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A referenced recording does not exist.
    #[error("Recording not found at {path:?} {location}")]
    NotFound {
        /// Path that did not resolve to a file.
        path: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The upload sink rejected the recording. The local file is left
    /// in place for a later retry by the caller.
    #[error("Upload failed: {reason} {location}")]
    UploadFailed {
        /// Description of the upload failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
