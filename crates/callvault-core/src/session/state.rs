use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Lifecycle state of a recording session.
///
/// Success path: `Idle → Preparing → Recording → Finalizing → Idle`.
/// Failures during preparation fall back to `Idle`; an abort from any
/// state releases resources and lands in `Idle` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session in flight.
    Idle,
    /// Permissions, storage, and the capture handle are being set up.
    Preparing,
    /// The capture handle is open and writing.
    Recording,
    /// The call-ended signal arrived; awaiting finalize.
    Finalizing,
}

/// One attempt to record a single outgoing call.
///
/// Owned exclusively by the lifecycle controller for its entire life and
/// destroyed when finalized or aborted. The capture handle lives here so
/// every exit path releases it through this value.
pub(crate) struct RecordingSession<H> {
    /// Session id for log correlation, returned by `begin_session`.
    pub(crate) id: Uuid,
    /// The dialed number, filename-sanitized.
    pub(crate) phone_number: String,
    /// When preparation started; encoded into the output filename.
    pub(crate) started_at: DateTime<Utc>,
    /// Output file, empty until the handle is opened.
    pub(crate) file_path: PathBuf,
    /// The native recording handle, present while `Recording`/`Finalizing`.
    pub(crate) handle: Option<H>,
    /// Current lifecycle state.
    pub(crate) state: SessionState,
}
