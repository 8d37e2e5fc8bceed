//! Shared fakes for exercising the lifecycle controller without a real
//! audio device, permission dialog, or routing hook.

use crate::{
    Capability, CaptureBackend, CaptureHandle, CoreResult, PermissionGate, PermissionState,
    RecorderError,
};

use std::{
    collections::HashMap,
    future::Future,
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;
use uuid::Uuid;

/// Fresh directory under the system temp dir, unique per test.
pub(crate) fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("callvault-test-{}-{}", tag, Uuid::new_v4()))
}

/// Capture backend that writes a configured number of bytes to the output
/// path and counts open handles, so tests can assert every handle is
/// released on every exit path.
pub(crate) struct FakeBackend {
    /// Bytes written to the output file on open; zero models a recording
    /// that captured nothing.
    pub(crate) bytes_to_write: usize,
    /// Frames reported by `stop`.
    pub(crate) frames: u64,
    /// When set, `open` fails with `RecordingStartFailed`.
    pub(crate) fail_open: bool,
    /// Currently open (unreleased) handles.
    pub(crate) open_handles: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub(crate) fn healthy(bytes: usize) -> Self {
        Self {
            bytes_to_write: bytes,
            frames: bytes as u64,
            fail_open: false,
            open_handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn silent() -> Self {
        let mut backend = Self::healthy(0);
        backend.frames = 0;
        backend
    }
}

impl CaptureBackend for FakeBackend {
    type Handle = FakeHandle;

    fn file_extension(&self) -> &'static str {
        "m4a"
    }

    #[track_caller]
    fn open(&mut self, path: &Path) -> CoreResult<FakeHandle> {
        if self.fail_open {
            return Err(RecorderError::RecordingStartFailed {
                reason: "fake device unavailable".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        std::fs::write(path, vec![0u8; self.bytes_to_write]).map_err(|e| {
            RecorderError::RecordingStartFailed {
                reason: format!("fake write failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            frames: self.frames,
            open_handles: Arc::clone(&self.open_handles),
        })
    }
}

pub(crate) struct FakeHandle {
    frames: u64,
    open_handles: Arc<AtomicUsize>,
}

impl CaptureHandle for FakeHandle {
    fn stop(self) -> CoreResult<u64> {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
        Ok(self.frames)
    }
}

/// Permission gate answering from a fixed table; anything unlisted is
/// denied. Counts calls so re-query behavior can be asserted.
pub(crate) struct FakeGate {
    grants: HashMap<Capability, PermissionState>,
    pub(crate) calls: Arc<AtomicUsize>,
}

impl FakeGate {
    pub(crate) fn all_granted() -> Self {
        Self {
            grants: [
                (Capability::Microphone, PermissionState::Granted),
                (Capability::MediaLibrary, PermissionState::Granted),
                (Capability::CallAudioRoute, PermissionState::Granted),
            ]
            .into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn denying(capability: Capability) -> Self {
        let mut gate = Self::all_granted();
        gate.grants.insert(capability, PermissionState::Denied);
        gate
    }
}

impl PermissionGate for FakeGate {
    fn check_and_request(
        &mut self,
        capabilities: &[Capability],
    ) -> impl Future<Output = HashMap<Capability, PermissionState>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let grants = capabilities
            .iter()
            .map(|cap| {
                (
                    *cap,
                    *self.grants.get(cap).unwrap_or(&PermissionState::Denied),
                )
            })
            .collect();
        async move { grants }
    }
}

/// Routing hook that counts enter/exit calls and can be made to fail on
/// enter, so tests can assert the failure is non-fatal and that routing
/// is always restored.
pub(crate) struct FakeRoute {
    pub(crate) fail_enter: bool,
    pub(crate) entered: Arc<AtomicUsize>,
    pub(crate) exited: Arc<AtomicUsize>,
}

impl FakeRoute {
    pub(crate) fn healthy() -> Self {
        Self {
            fail_enter: false,
            entered: Arc::new(AtomicUsize::new(0)),
            exited: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        let mut route = Self::healthy();
        route.fail_enter = true;
        route
    }
}

impl crate::CallAudioRoute for FakeRoute {
    #[track_caller]
    fn enter_call_capture(&mut self) -> CoreResult<()> {
        if self.fail_enter {
            return Err(RecorderError::RecordingStartFailed {
                reason: "fake routing hook failed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.entered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exit_call_capture(&mut self) -> CoreResult<()> {
        self.exited.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
