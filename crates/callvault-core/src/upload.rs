//! Best-effort handoff of finished recordings to a remote endpoint.
//!
//! One multipart POST per recording, any 2xx is success. On success the
//! local file is deleted; on failure it is left in place so the caller
//! can retry later. No automatic retry or backoff.

use crate::{CoreResult, RecorderError, RecordingRecord};

use std::panic::Location;

use error_location::ErrorLocation;
use reqwest::multipart::{Form, Part};
use tracing::{info, instrument, warn};

/// Default multipart field name the endpoint receives the file under.
pub(crate) const DEFAULT_FIELD_NAME: &str = "audio";

/// HTTP upload sink for finished recordings.
#[derive(Debug, Clone)]
pub struct UploadSink {
    client: reqwest::Client,
    endpoint: String,
    field_name: String,
}

impl UploadSink {
    /// Sink posting to `endpoint` with the default `audio` form field.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
        }
    }

    /// Override the multipart field name.
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Upload one recording. Deletes the local file on success (a failed
    /// delete is logged, not fatal); leaves it in place on failure. The
    /// caller is responsible for dropping the catalog entry once the file
    /// is gone.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::NotFound`] if the local file no longer exists.
    /// - [`RecorderError::UploadFailed`] for any transport error or
    ///   non-2xx response.
    #[instrument(skip(self), fields(file = %record.file_name))]
    pub async fn upload(&self, record: &RecordingRecord) -> CoreResult<()> {
        let bytes = tokio::fs::read(&record.uri).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RecorderError::NotFound {
                    path: record.uri.clone().into(),
                    location: ErrorLocation::from(Location::caller()),
                }
            } else {
                RecorderError::UploadFailed {
                    reason: format!("Failed to read {}: {}", record.uri, e),
                    location: ErrorLocation::from(Location::caller()),
                }
            }
        })?;

        let part = Part::bytes(bytes)
            .file_name(record.file_name.clone())
            .mime_str(mime_for(&record.file_name))
            .map_err(|e| RecorderError::UploadFailed {
                reason: format!("Invalid mime type: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let form = Form::new().part(self.field_name.clone(), part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecorderError::UploadFailed {
                reason: format!("Request failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if !response.status().is_success() {
            return Err(RecorderError::UploadFailed {
                reason: format!("Server returned {}", response.status()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!(endpoint = %self.endpoint, "Recording uploaded");

        // The remote copy is now authoritative.
        if let Err(e) = tokio::fs::remove_file(&record.uri).await {
            warn!(uri = %record.uri, error = ?e, "Uploaded but local delete failed");
        }

        Ok(())
    }
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/m4a",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
