//! Callvault Core Library
//!
//! Call-recording lifecycle engine: permission gating, capture handle
//! ownership, recording storage and catalog, and best-effort upload.
//!
//! # Example
//!
//! ```no_run
//! use callvault_core::{
//!     CallRecorder, CoreResult, CpalCaptureBackend, ImplicitPermissionGate,
//!     NoopCallRoute, RecordingDirectory,
//! };
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let backend = CpalCaptureBackend::new()?;
//!     let directory = RecordingDirectory::new("/tmp/recordings");
//!     let mut recorder = CallRecorder::new(
//!         backend,
//!         ImplicitPermissionGate::desktop(),
//!         NoopCallRoute,
//!         directory,
//!     );
//!
//!     let session_id = recorder.begin_session("555-1234").await?;
//!     println!("recording session {session_id}");
//!
//!     // ... the platform places the call; later the app foregrounds ...
//!     recorder.on_call_ended();
//!     let record = recorder.finalize()?;
//!     println!("saved {}", record.file_name);
//!     Ok(())
//! }
//! ```

mod audio;
mod catalog;
mod error;
mod permissions;
mod routing;
mod session;
mod storage;
mod upload;

pub use {
    audio::{CaptureBackend, CaptureHandle, CpalCaptureBackend, CpalCaptureHandle},
    catalog::{RecordingCatalog, RecordingRecord},
    error::{RecorderError, Result as CoreResult},
    permissions::{Capability, ImplicitPermissionGate, PermissionGate, PermissionState},
    routing::{CallAudioRoute, NoopCallRoute},
    session::{CallRecorder, SessionState},
    storage::RecordingDirectory,
    upload::UploadSink,
};
