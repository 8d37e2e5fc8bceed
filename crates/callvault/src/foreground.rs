//! The injectable call-ended event source.
//!
//! The controller has no telephony-state API: the only observable hint
//! that a call ended is the host application transitioning from background
//! to foreground while a recording is in flight. That is a heuristic — a
//! user switching apps mid-call produces a false call-ended signal and
//! nothing here can disambiguate it. Platform glue (or, on desktop, the
//! console's `end` command) feeds events into the channel this watcher
//! forwards from; swapping in a real telephony-state source later touches
//! only this component, not the state machine.

use crate::{AppCommand, AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

/// A host-application foreground transition.
#[derive(Debug, Clone, Copy)]
pub struct ForegroundEvent;

/// Forwards foreground transitions to the app as call-ended commands.
pub struct ForegroundWatcher {
    events: mpsc::Receiver<ForegroundEvent>,
    command_tx: mpsc::Sender<AppCommand>,
}

impl ForegroundWatcher {
    /// Watcher forwarding from `events` into the app command channel.
    pub fn new(
        events: mpsc::Receiver<ForegroundEvent>,
        command_tx: mpsc::Sender<AppCommand>,
    ) -> Self {
        Self { events, command_tx }
    }

    /// Run until shutdown or until the event source closes.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Foreground watcher shutting down");
                    break;
                }
                event = self.events.recv() => {
                    match event {
                        Some(_) => {
                            debug!("App foregrounded, forwarding call-ended signal");
                            self.command_tx
                                .send(AppCommand::CallEnded)
                                .await
                                .map_err(|e| AppError::ChannelSendFailed {
                                    message: format!("Failed to send CallEnded: {}", e),
                                    location: ErrorLocation::from(Location::caller()),
                                })?;
                        }
                        None => {
                            info!("Foreground event source closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
