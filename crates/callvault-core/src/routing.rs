//! Device audio-routing toggle for in-call capture.
//!
//! On platforms with a native hook this flips the audio subsystem into a
//! mode that favors capturing the in-call audio path (and back out again).
//! It is a best-effort hardware hint: the lifecycle controller logs a
//! failure and proceeds with default routing, so implementations should
//! be idempotent and side-effect-only.

use crate::CoreResult;

use tracing::debug;

/// Platform-specific toggle of the device audio route.
pub trait CallAudioRoute: Send {
    /// Route device audio into call-capture mode. Idempotent.
    fn enter_call_capture(&mut self) -> CoreResult<()>;

    /// Restore the default audio route. Idempotent.
    fn exit_call_capture(&mut self) -> CoreResult<()>;
}

/// Route for platforms without a native call-capture hook.
///
/// Both operations are no-ops that report success, so the controller
/// records through the default input path.
pub struct NoopCallRoute;

impl CallAudioRoute for NoopCallRoute {
    fn enter_call_capture(&mut self) -> CoreResult<()> {
        debug!("No call-capture routing hook on this platform, using default route");
        Ok(())
    }

    fn exit_call_capture(&mut self) -> CoreResult<()> {
        Ok(())
    }
}
