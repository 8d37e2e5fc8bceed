//! Capture backend seam between the lifecycle controller and the
//! platform recorder.
//!
//! The handle is a scarce exclusive resource: exactly one may be open at
//! a time, owned by the current session, and released on every exit path.
//! `stop` consumes the handle so the type system enforces the release.

use crate::CoreResult;

use std::path::Path;

/// Opens native recording handles.
pub trait CaptureBackend: Send {
    /// The handle type produced by [`open`](Self::open).
    type Handle: CaptureHandle;

    /// File extension of the container this backend writes (no dot).
    fn file_extension(&self) -> &'static str;

    /// Open a recording handle writing to `path` and start capturing.
    ///
    /// # Errors
    ///
    /// Returns
    /// [`RecorderError::RecordingStartFailed`](crate::RecorderError::RecordingStartFailed)
    /// if the device or the output file cannot be opened.
    fn open(&mut self, path: &Path) -> CoreResult<Self::Handle>;
}

/// An open native recording handle.
pub trait CaptureHandle: Send {
    /// Stop capturing, flush and close the output file, and release the
    /// handle. Returns the number of audio frames written.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file could not be finalized; the
    /// handle is released regardless.
    fn stop(self) -> CoreResult<u64>;
}
