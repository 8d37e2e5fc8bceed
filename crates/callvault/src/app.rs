use crate::{AppCommand, AppError, AppResult};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;

use callvault_core::{CallAudioRoute, CallRecorder, CaptureBackend, PermissionGate, UploadSink};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// Runs on the async runtime and owns the command loop. The recorder sits
/// behind an async mutex because the background upload task needs catalog
/// access after a successful handoff. Stopping a capture handle can block
/// for seconds while the capture thread drains, so finalize and abort run
/// on the blocking thread pool rather than an async worker.
pub struct App<B, G, R>
where
    B: CaptureBackend + 'static,
    G: PermissionGate + 'static,
    R: CallAudioRoute + 'static,
{
    pub(crate) recorder: Arc<Mutex<CallRecorder<B, G, R>>>,
    pub(crate) upload: Option<UploadSink>,
    pub(crate) auto_upload: bool,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl<B, G, R> App<B, G, R>
where
    B: CaptureBackend + 'static,
    G: PermissionGate + 'static,
    R: CallAudioRoute + 'static,
{
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Callvault starting");

        while let Some(command) = self.command_rx.recv().await {
            match command {
                AppCommand::Dial { number } => self.handle_dial(&number).await,
                AppCommand::CallEnded => self.handle_call_ended().await,
                AppCommand::ListRecordings => self.list_recordings().await,
                AppCommand::DeleteRecording { uri } => self.delete_recording(&uri).await,
                AppCommand::Shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        // Release the capture handle if a call is still in flight.
        self.abort_in_flight().await;

        let _ = self.shutdown_tx.send(true);
        info!("Callvault shut down successfully");

        Ok(())
    }

    /// Start a session, then hand the dial to the platform telephony app.
    ///
    /// The session starts first so capture covers the call from ring;
    /// if the handoff itself fails the session is aborted.
    #[instrument(skip(self))]
    async fn handle_dial(&self, number: &str) {
        let session_id = {
            let mut recorder = self.recorder.lock().await;
            match recorder.begin_session(number).await {
                Ok(id) => id,
                Err(e) => {
                    error!(error = ?e, "Failed to start recording session");
                    return;
                }
            }
        };

        if let Err(e) = open::that(format!("tel:{}", number)) {
            let err = AppError::DialFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            };
            error!(error = ?err, "Telephony handoff failed, aborting session");
            self.abort_in_flight().await;
            return;
        }

        info!(session_id = %session_id, number = %number, "Dialing, recording in flight");
    }

    /// Finalize the recording after the call-ended signal and kick off
    /// the optional background upload.
    #[instrument(skip(self))]
    pub(crate) async fn handle_call_ended(&self) {
        let recorder = Arc::clone(&self.recorder);
        // Stopping the handle blocks until the capture thread drains.
        let finalized = tokio::task::spawn_blocking(move || {
            let mut recorder = recorder.blocking_lock();
            recorder.on_call_ended().then(|| recorder.finalize())
        })
        .await;

        let record = match finalized {
            Ok(None) => return,
            Ok(Some(Ok(record))) => record,
            Ok(Some(Err(e))) => {
                warn!(error = ?e, "Recording discarded");
                return;
            }
            Err(e) => {
                warn!(error = ?e, "Finalize task failed");
                return;
            }
        };

        info!(file = %record.file_name, "Recording saved");

        if !self.auto_upload {
            return;
        }
        let Some(sink) = self.upload.clone() else {
            return;
        };

        let recorder = Arc::clone(&self.recorder);
        tokio::task::spawn(async move {
            match sink.upload(&record).await {
                Ok(()) => {
                    // The local file is gone; drop the catalog entry so
                    // no record uri dangles.
                    recorder.lock().await.catalog_mut().remove(&record.uri);
                    info!(file = %record.file_name, "Recording uploaded, local copy removed");
                }
                Err(e) => {
                    warn!(file = %record.file_name, error = ?e, "Upload failed, keeping local copy");
                }
            }
        });
    }

    /// Abort any in-flight session on the blocking pool; abort stops the
    /// capture handle the same way finalize does.
    async fn abort_in_flight(&self) {
        let recorder = Arc::clone(&self.recorder);
        if let Err(e) = tokio::task::spawn_blocking(move || recorder.blocking_lock().abort()).await
        {
            warn!(error = ?e, "Abort task failed");
        }
    }

    #[instrument(skip(self))]
    async fn list_recordings(&self) {
        let recorder = self.recorder.lock().await;
        let records = recorder.catalog().records();
        if records.is_empty() {
            info!("No recordings");
            return;
        }
        for record in records {
            info!(
                file = %record.file_name,
                number = %record.phone_number,
                timestamp = %record.timestamp,
                uri = %record.uri,
                "Recording"
            );
        }
    }

    #[instrument(skip(self))]
    async fn delete_recording(&self, uri: &str) {
        let mut recorder = self.recorder.lock().await;
        match recorder.delete_recording(uri) {
            Ok(()) => info!(uri = %uri, "Recording deleted"),
            Err(e) => warn!(uri = %uri, error = ?e, "Failed to delete recording"),
        }
    }
}
