mod controller;
mod state;

pub(crate) use state::RecordingSession;

pub use {controller::CallRecorder, state::SessionState};
