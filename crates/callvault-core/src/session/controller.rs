//! Call-recording lifecycle controller.
//!
//! Owns the single live [`RecordingSession`], the recording directory, and
//! the catalog. The controller cannot observe telephony state directly:
//! the only call-ended signal available is the host application returning
//! to the foreground, delivered via [`CallRecorder::on_call_ended`]. That
//! signal is a heuristic — a user switching apps mid-call produces a false
//! positive the controller cannot disambiguate.

use crate::{
    CoreResult, RecorderError, RecordingCatalog, RecordingDirectory, RecordingRecord,
    audio::{CaptureBackend, CaptureHandle},
    permissions::{Capability, PermissionGate, PermissionState},
    routing::CallAudioRoute,
    session::{RecordingSession, SessionState},
    storage,
};

use std::{fs, panic::Location, path::PathBuf};

use chrono::Utc;
use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Drives a recording session from permission check through finalization.
///
/// At most one session is live at a time; a `begin_session` while any
/// session exists is rejected with
/// [`RecorderError::AlreadyRecording`]. All lifecycle methods take
/// `&mut self`, so the state machine is never reentered while an
/// operation is in flight.
pub struct CallRecorder<B, G, R>
where
    B: CaptureBackend,
    G: PermissionGate,
    R: CallAudioRoute,
{
    backend: B,
    permissions: G,
    route: R,
    directory: RecordingDirectory,
    catalog: RecordingCatalog,
    required: Vec<Capability>,
    session: Option<RecordingSession<B::Handle>>,
}

impl<B, G, R> CallRecorder<B, G, R>
where
    B: CaptureBackend,
    G: PermissionGate,
    R: CallAudioRoute,
{
    /// Controller requiring microphone and media-library grants.
    ///
    /// [`Capability::CallAudioRoute`] is a best-effort hint, not a
    /// requirement, so it is not in the default required set; use
    /// [`require_capabilities`](Self::require_capabilities) on platforms
    /// where it is mandatory.
    pub fn new(backend: B, permissions: G, route: R, directory: RecordingDirectory) -> Self {
        Self {
            backend,
            permissions,
            route,
            directory,
            catalog: RecordingCatalog::new(),
            required: vec![Capability::Microphone, Capability::MediaLibrary],
            session: None,
        }
    }

    /// Replace the set of capabilities that must be granted before a
    /// session may start.
    pub fn require_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.required = capabilities;
        self
    }

    /// Current lifecycle state; `Idle` when no session exists.
    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, |s| s.state)
    }

    /// The catalog of finalized recordings.
    pub fn catalog(&self) -> &RecordingCatalog {
        &self.catalog
    }

    /// Mutable catalog access, e.g. to drop an entry after an upload.
    pub fn catalog_mut(&mut self) -> &mut RecordingCatalog {
        &mut self.catalog
    }

    /// The recording directory this controller writes into.
    pub fn directory(&self) -> &RecordingDirectory {
        &self.directory
    }

    /// Load the recordings already on disk into the catalog. Returns how
    /// many were found.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::StorageUnavailable`] if the directory
    /// cannot be created or read.
    #[track_caller]
    pub fn seed_catalog(&mut self) -> CoreResult<usize> {
        self.directory.ensure()?;
        let records = self.directory.list_existing()?;
        let count = records.len();
        self.catalog.replace(records);
        Ok(count)
    }

    /// Start a recording session for an outgoing call to `phone_number`.
    ///
    /// Valid only in `Idle`. Ensures the recording directory exists,
    /// checks permissions, enters call-capture routing (best-effort), and
    /// opens the capture handle against the computed output path. On
    /// success the session is `Recording` and its id is returned; the
    /// caller then hands the actual dial to the platform. A number with
    /// no filename-safe characters is recorded as `unknown` so the
    /// output filename still parses back into a record.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::AlreadyRecording`] if any session is in flight.
    /// - [`RecorderError::StorageUnavailable`] if the directory cannot be
    ///   created.
    /// - [`RecorderError::PermissionDenied`] naming the first required
    ///   capability that was not granted.
    /// - [`RecorderError::RecordingStartFailed`] if the capture handle
    ///   cannot be opened.
    ///
    /// Every failure returns the controller to `Idle`.
    #[instrument(skip(self))]
    pub async fn begin_session(&mut self, phone_number: &str) -> CoreResult<Uuid> {
        if self.session.is_some() {
            return Err(RecorderError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let id = Uuid::new_v4();
        let number = storage::sanitize_number(phone_number);
        let started_at = Utc::now();
        // Occupy the session slot before the first await so the state
        // observably leaves Idle for the whole preparation.
        self.session = Some(RecordingSession {
            id,
            phone_number: number.clone(),
            started_at,
            file_path: PathBuf::new(),
            handle: None,
            state: SessionState::Preparing,
        });

        if let Err(e) = self.directory.ensure() {
            self.session = None;
            return Err(e);
        }

        let grants = self.permissions.check_and_request(&self.required).await;
        for capability in &self.required {
            if grants.get(capability) != Some(&PermissionState::Granted) {
                self.session = None;
                return Err(RecorderError::PermissionDenied {
                    capability: *capability,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        // Best-effort hardware hint: recording proceeds with default
        // routing if the in-call path cannot be engaged.
        if let Err(e) = self.route.enter_call_capture() {
            warn!(error = ?e, "Call-capture routing unavailable, using default route");
        }

        let path = self
            .directory
            .recording_path(started_at, &number, self.backend.file_extension());

        match self.backend.open(&path) {
            Ok(handle) => {
                if let Some(session) = self.session.as_mut() {
                    session.file_path = path.clone();
                    session.handle = Some(handle);
                    session.state = SessionState::Recording;
                }
                info!(session_id = %id, path = ?path, "Recording session started");
                Ok(id)
            }
            Err(e) => {
                if let Err(exit_err) = self.route.exit_call_capture() {
                    warn!(error = ?exit_err, "Failed to restore audio routing");
                }
                self.session = None;
                Err(e)
            }
        }
    }

    /// Deliver the call-ended signal: the host app transitioned from
    /// background to foreground.
    ///
    /// Only a `Recording` session reacts, moving to `Finalizing`; in any
    /// other state the signal is logged and ignored. Returns whether the
    /// transition happened, so the caller knows to follow up with
    /// [`finalize`](Self::finalize).
    #[instrument(skip(self))]
    pub fn on_call_ended(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if session.state == SessionState::Recording => {
                session.state = SessionState::Finalizing;
                info!(session_id = %session.id, "Call-ended signal received");
                true
            }
            _ => {
                debug!("Foreground transition with no recording in flight, ignored");
                false
            }
        }
    }

    /// Stop the capture handle, restore audio routing, and persist the
    /// recording.
    ///
    /// Accepted from `Finalizing` (the normal path, after
    /// [`on_call_ended`](Self::on_call_ended)) and directly from
    /// `Recording`, so a host with an explicit stop control can finalize
    /// without the call-ended signal.
    ///
    /// On success the file is verified non-empty, a [`RecordingRecord`]
    /// is appended to the catalog and returned. An empty or missing file
    /// is removed and reported as
    /// [`RecorderError::RecordingEmptyOrMissing`] — recoverable, the
    /// session is simply lost. Either way the controller is `Idle`
    /// afterwards and the handle is released.
    ///
    /// # Errors
    ///
    /// [`RecorderError::RecordingEmptyOrMissing`] if there is no
    /// finalizable session or the output captured no audio.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn finalize(&mut self) -> CoreResult<RecordingRecord> {
        let mut session = match self.session.take() {
            Some(s)
                if s.state == SessionState::Recording || s.state == SessionState::Finalizing =>
            {
                s
            }
            other => {
                self.session = other;
                warn!("Finalize without a finalizable session");
                return Err(RecorderError::RecordingEmptyOrMissing {
                    path: self.directory.path().to_path_buf(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let frames = match session.handle.take() {
            Some(handle) => handle.stop().unwrap_or_else(|e| {
                warn!(session_id = %session.id, error = ?e, "Capture stop failed");
                0
            }),
            None => 0,
        };

        if let Err(e) = self.route.exit_call_capture() {
            warn!(error = ?e, "Failed to restore audio routing");
        }

        let file_len = fs::metadata(&session.file_path).map(|m| m.len()).ok();
        // Frame count decides "empty": a WAV header alone makes even a
        // silent file non-zero-length.
        if frames == 0 || file_len.is_none_or(|len| len == 0) {
            if session.file_path.exists() {
                if let Err(e) = fs::remove_file(&session.file_path) {
                    warn!(path = ?session.file_path, error = ?e, "Failed to remove empty recording");
                }
            }
            info!(session_id = %session.id, "Recording discarded as empty or missing");
            return Err(RecorderError::RecordingEmptyOrMissing {
                path: session.file_path,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let record = RecordingRecord {
            uri: session.file_path.to_string_lossy().into_owned(),
            file_name: session
                .file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            timestamp: storage::encode_timestamp(session.started_at),
            phone_number: session.phone_number.clone(),
        };
        self.catalog.push(record.clone());

        info!(
            session_id = %session.id,
            file = %record.file_name,
            frames,
            "Recording finalized"
        );

        Ok(record)
    }

    /// Abort the in-flight session, whatever its state.
    ///
    /// Releases the capture handle, best-effort-deletes the partial file,
    /// and restores audio routing. Never fails outwardly; cleanup errors
    /// are logged only. A no-op when `Idle`.
    #[instrument(skip(self))]
    pub fn abort(&mut self) {
        let Some(mut session) = self.session.take() else {
            debug!("Abort with no session in flight");
            return;
        };

        if let Some(handle) = session.handle.take() {
            if let Err(e) = handle.stop() {
                warn!(session_id = %session.id, error = ?e, "Capture stop failed during abort");
            }
        }

        if !session.file_path.as_os_str().is_empty() && session.file_path.exists() {
            if let Err(e) = fs::remove_file(&session.file_path) {
                warn!(path = ?session.file_path, error = ?e, "Failed to remove partial recording");
            }
        }

        if let Err(e) = self.route.exit_call_capture() {
            warn!(error = ?e, "Failed to restore audio routing");
        }

        info!(session_id = %session.id, "Recording session aborted");
    }

    /// Delete a recording from storage and the catalog together, so no
    /// catalog entry dangles.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::NotFound`] if the file is absent (any
    /// stale catalog entry is still dropped), or
    /// [`RecorderError::StorageUnavailable`] for other IO failures.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn delete_recording(&mut self, uri: &str) -> CoreResult<()> {
        let result = self.directory.delete(uri);
        match &result {
            Ok(()) | Err(RecorderError::NotFound { .. }) => {
                self.catalog.remove(uri);
            }
            Err(_) => {}
        }
        result
    }
}
