/// Commands sent from the input surfaces to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start a recording session and hand the dial to the platform.
    Dial {
        /// The number to dial.
        number: String,
    },
    /// The call-ended signal: the host app returned to the foreground.
    CallEnded,
    /// Log the catalog of finished recordings.
    ListRecordings,
    /// Delete one recording from storage and the catalog.
    DeleteRecording {
        /// Full path of the recording to delete.
        uri: String,
    },
    /// Request application shutdown.
    Shutdown,
}
