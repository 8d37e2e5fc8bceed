//! CPAL capture backend writing WAV through hound.
//!
//! `cpal::Stream` is `!Send`, so each open handle runs a dedicated capture
//! thread that owns the stream and the WAV writer. The handle only carries
//! the shutdown flag and the completion channel, which keeps it `Send` and
//! lets the lifecycle controller live behind an async mutex.

use crate::{
    CoreResult, RecorderError,
    audio::{CaptureBackend, CaptureHandle},
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, error, info, instrument};

/// How long `open` waits for the capture thread to report a running stream.
const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long `stop` waits for the capture thread to finalize the file.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval of the capture thread's shutdown loop.
const SHUTDOWN_POLL: Duration = Duration::from_millis(25);

type SharedWriter = Arc<Mutex<Option<WavWriter<std::io::BufWriter<std::fs::File>>>>>;

/// Capture backend using the default CPAL input device.
pub struct CpalCaptureBackend;

impl CpalCaptureBackend {
    /// Backend bound to the default host.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::RecordingStartFailed`] if no audio input
    /// device is available.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| RecorderError::RecordingStartFailed {
                reason: "No audio input device available".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            "Capture backend initialized"
        );

        Ok(Self)
    }
}

impl CaptureBackend for CpalCaptureBackend {
    type Handle = CpalCaptureHandle;

    fn file_extension(&self) -> &'static str {
        "wav"
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn open(&mut self, path: &Path) -> CoreResult<CpalCaptureHandle> {
        let path = path.to_path_buf();
        let shutdown = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let thread_shutdown = Arc::clone(&shutdown);
        let thread = thread::Builder::new()
            .name("callvault-capture".to_string())
            .spawn(move || capture_thread(path, thread_shutdown, ready_tx, done_tx))
            .map_err(|e| RecorderError::RecordingStartFailed {
                reason: format!("Failed to spawn capture thread: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => {
                info!("Capture handle opened");
                Ok(CpalCaptureHandle {
                    shutdown,
                    done_rx,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                shutdown.store(true, Ordering::Release);
                Err(RecorderError::RecordingStartFailed {
                    reason: "Audio stream did not start within timeout".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }
}

/// An open CPAL recording handle. The stream itself lives on the capture
/// thread; dropping this without calling `stop` leaves the thread running
/// until process exit, so the controller always stops handles explicitly.
pub struct CpalCaptureHandle {
    shutdown: Arc<AtomicBool>,
    done_rx: mpsc::Receiver<CoreResult<u64>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CaptureHandle for CpalCaptureHandle {
    #[track_caller]
    fn stop(mut self) -> CoreResult<u64> {
        self.shutdown.store(true, Ordering::Release);

        let result = self
            .done_rx
            .recv_timeout(STOP_TIMEOUT)
            .map_err(|_| RecorderError::StorageUnavailable {
                reason: "Capture thread did not finish within timeout".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }

        result
    }
}

fn capture_thread(
    path: PathBuf,
    shutdown: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<CoreResult<()>>,
    done_tx: mpsc::Sender<CoreResult<u64>>,
) {
    let (stream, writer, frames, channels) = match open_stream(&path, &shutdown) {
        Ok(parts) => {
            let _ = ready_tx.send(Ok(()));
            parts
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    while !shutdown.load(Ordering::Acquire) {
        thread::sleep(SHUTDOWN_POLL);
    }

    drop(stream);
    // Brief yield so an in-flight callback observes the shutdown flag
    // before the writer is finalized.
    thread::sleep(Duration::from_millis(5));

    let _ = done_tx.send(finalize_writer(&path, &writer, &frames, channels));
}

#[track_caller]
fn open_stream(
    path: &Path,
    shutdown: &Arc<AtomicBool>,
) -> CoreResult<(cpal::Stream, SharedWriter, Arc<AtomicU64>, u16)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| RecorderError::RecordingStartFailed {
            reason: "No audio input device available".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let config: cpal::StreamConfig = device
        .default_input_config()
        .map_err(|e| RecorderError::RecordingStartFailed {
            reason: format!("Failed to get input config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?
        .into();

    let channels = config.channels;
    let spec = WavSpec {
        channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let writer: SharedWriter = Arc::new(Mutex::new(Some(
        WavWriter::create(path, spec).map_err(|e| RecorderError::RecordingStartFailed {
            reason: format!("Failed to create {:?}: {}", path, e),
            location: ErrorLocation::from(Location::caller()),
        })?,
    )));

    let callback_writer = Arc::clone(&writer);
    let callback_shutdown = Arc::clone(shutdown);
    let samples_written = Arc::new(AtomicU64::new(0));
    let callback_samples = Arc::clone(&samples_written);
    let write_failed = Arc::new(AtomicBool::new(false));

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if callback_shutdown.load(Ordering::Acquire) || write_failed.load(Ordering::Acquire)
                {
                    return;
                }
                // Recover from lock poison: a previous holder panicked,
                // but the writer itself is still usable.
                let mut guard = callback_writer.lock().unwrap_or_else(|e| {
                    error!("Writer lock poisoned, recovering: {}", e);
                    e.into_inner()
                });
                if let Some(w) = guard.as_mut() {
                    for &sample in data {
                        if let Err(e) = w.write_sample(sample) {
                            error!("WAV write failed, dropping further samples: {}", e);
                            write_failed.store(true, Ordering::Release);
                            return;
                        }
                    }
                    callback_samples.fetch_add(data.len() as u64, Ordering::Relaxed);
                }
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| RecorderError::RecordingStartFailed {
            reason: format!("Failed to build stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    stream.play().map_err(|e| RecorderError::RecordingStartFailed {
        reason: format!("Failed to start stream: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    debug!(
        channels,
        sample_rate = spec.sample_rate,
        "Capture stream started"
    );

    Ok((stream, writer, samples_written, channels))
}

#[track_caller]
fn finalize_writer(
    path: &Path,
    writer: &SharedWriter,
    samples_written: &Arc<AtomicU64>,
    channels: u16,
) -> CoreResult<u64> {
    let taken = writer
        .lock()
        .unwrap_or_else(|e| {
            error!("Writer lock poisoned, recovering: {}", e);
            e.into_inner()
        })
        .take();

    if let Some(w) = taken {
        w.finalize().map_err(|e| RecorderError::StorageUnavailable {
            reason: format!("Failed to finalize {:?}: {}", path, e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    let frames = samples_written.load(Ordering::Acquire) / u64::from(channels.max(1));
    debug!(frames, "Capture finished");

    Ok(frames)
}
