//! Callvault: dialer companion that records outgoing calls.
//!
//! The UI surfaces (keypad, contact browser) live in the host dialer
//! application; this binary owns the recording lifecycle: permission
//! gating, capture, storage, catalog, and the optional upload handoff.

mod app;
mod app_command;
mod config;
mod console;
mod error;
mod foreground;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    console::ConsoleInput,
    error::{AppError, Result as AppResult},
    foreground::ForegroundWatcher,
};

use crate::config::Config;

use std::sync::Arc;

use callvault_core::{
    CallRecorder, CpalCaptureBackend, ImplicitPermissionGate, NoopCallRoute, RecordingDirectory,
    UploadSink,
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{error, info, warn};

/// Application entry point.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("callvault=debug")
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let backend = match CpalCaptureBackend::new() {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize capture backend: {:?}", e);
            std::process::exit(1);
        }
    };

    let directory = RecordingDirectory::new(&config.recording.directory);
    let mut recorder = CallRecorder::new(
        backend,
        ImplicitPermissionGate::desktop(),
        NoopCallRoute,
        directory,
    );

    match recorder.seed_catalog() {
        Ok(count) => info!(count, "Recording catalog seeded"),
        Err(e) => warn!(error = ?e, "Could not seed catalog, starting empty"),
    }

    let upload = config
        .upload
        .endpoint
        .as_ref()
        .map(|endpoint| UploadSink::new(endpoint).with_field_name(&config.upload.field_name));

    let (command_tx, command_rx) = mpsc::channel(32);
    let (foreground_tx, foreground_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let console = ConsoleInput::new(command_tx.clone(), foreground_tx);
    let watcher = ForegroundWatcher::new(foreground_rx, command_tx);

    let app = App {
        recorder: Arc::new(Mutex::new(recorder)),
        upload,
        auto_upload: config.upload.auto_upload,
        command_rx,
        shutdown_tx,
    };

    tokio::join!(
        async {
            if let Err(e) = console.run(shutdown_rx.clone()).await {
                error!(error = ?e, "Console error");
            }
        },
        async {
            if let Err(e) = watcher.run(shutdown_rx.clone()).await {
                error!(error = ?e, "Foreground watcher error");
            }
        },
        async {
            if let Err(e) = app.run().await {
                error!(error = ?e, "App error");
            }
        }
    );
}
