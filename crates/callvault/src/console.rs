//! Console driver standing in for the dialer UI.
//!
//! Reads stdin lines and maps them to app commands. The `end` command
//! feeds the foreground channel, simulating the host application
//! returning to the foreground after a call.

use crate::{AppCommand, AppError, AppResult, foreground::ForegroundEvent};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{info, instrument, warn};

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the app command channel.
    App(AppCommand),
    /// Simulated app-foreground transition.
    Foreground,
    /// Print the command summary.
    Help,
    /// Blank line, nothing to do.
    Empty,
    /// Anything unrecognized, kept for the warning message.
    Unknown(String),
}

/// Parse a console line into a command.
pub(crate) fn parse_line(line: &str) -> ConsoleCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ConsoleCommand::Empty;
    }

    let (command, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let argument = rest.trim();

    match command {
        "dial" if !argument.is_empty() => ConsoleCommand::App(AppCommand::Dial {
            number: argument.to_string(),
        }),
        "end" => ConsoleCommand::Foreground,
        "list" => ConsoleCommand::App(AppCommand::ListRecordings),
        "delete" if !argument.is_empty() => ConsoleCommand::App(AppCommand::DeleteRecording {
            uri: argument.to_string(),
        }),
        "quit" | "exit" => ConsoleCommand::App(AppCommand::Shutdown),
        "help" => ConsoleCommand::Help,
        _ => ConsoleCommand::Unknown(trimmed.to_string()),
    }
}

const HELP: &str = "commands: dial <number> | end | list | delete <uri> | help | quit";

/// Stdin command reader.
pub struct ConsoleInput {
    command_tx: mpsc::Sender<AppCommand>,
    foreground_tx: mpsc::Sender<ForegroundEvent>,
}

impl ConsoleInput {
    /// Console feeding the app command channel and the foreground channel.
    pub fn new(
        command_tx: mpsc::Sender<AppCommand>,
        foreground_tx: mpsc::Sender<ForegroundEvent>,
    ) -> Self {
        Self {
            command_tx,
            foreground_tx,
        }
    }

    /// Read stdin until shutdown or end of input. End of input requests
    /// application shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("{}", HELP);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console shutting down");
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(&line).await?,
                        Ok(None) => {
                            info!("End of input, shutting down");
                            self.send(AppCommand::Shutdown).await?;
                            break;
                        }
                        Err(e) => return Err(AppError::from(e)),
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_line(&self, line: &str) -> AppResult<()> {
        match parse_line(line) {
            ConsoleCommand::App(command) => self.send(command).await?,
            ConsoleCommand::Foreground => {
                self.foreground_tx
                    .send(ForegroundEvent)
                    .await
                    .map_err(|e| AppError::ChannelSendFailed {
                        message: format!("Failed to send foreground event: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
            }
            ConsoleCommand::Help => info!("{}", HELP),
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(input) => {
                warn!(input = %input, "Unknown command, type 'help'");
            }
        }
        Ok(())
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
