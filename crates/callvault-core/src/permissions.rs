//! Permission gating for the capabilities call recording depends on.
//!
//! The gate never errors: a platform that lacks a capability entirely
//! reports it as [`PermissionState::Denied`]. Repeated calls re-query
//! rather than trusting a cache, since the user may revoke a grant in
//! system settings between calls.

use std::{collections::{HashMap, HashSet}, fmt, future::Future};

use tracing::debug;

/// A platform capability the recorder may need before a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Microphone / audio-input access.
    Microphone,
    /// Read/write access to the device media library.
    MediaLibrary,
    /// Permission to route the in-call audio path into capture.
    CallAudioRoute,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Microphone => write!(f, "microphone"),
            Capability::MediaLibrary => write!(f, "media library"),
            Capability::CallAudioRoute => write!(f, "call audio route"),
        }
    }
}

/// Tri-state permission status for a single capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The platform has not been asked yet.
    Unknown,
    /// The user (or platform) granted the capability.
    Granted,
    /// The capability was denied or does not exist on this platform.
    Denied,
}

/// Queries and requests platform permissions.
///
/// Implementations may suspend while an OS permission dialog is open.
/// There is no cancellation of an in-flight request; the dialog is
/// awaited to completion.
pub trait PermissionGate: Send {
    /// Check (and, where the platform supports it, request) each listed
    /// capability. Returns one entry per requested capability; a missing
    /// entry is treated as denied by callers.
    fn check_and_request(
        &mut self,
        capabilities: &[Capability],
    ) -> impl Future<Output = HashMap<Capability, PermissionState>> + Send;
}

/// Gate for desktop platforms where audio and filesystem access are
/// implicit: nothing to request, so grants are decided by construction.
/// [`Capability::CallAudioRoute`] has no desktop equivalent and always
/// reports denied unless explicitly granted.
pub struct ImplicitPermissionGate {
    granted: HashSet<Capability>,
}

impl ImplicitPermissionGate {
    /// Gate with the grants a desktop host implies: microphone and
    /// media-library access, no in-call audio route.
    pub fn desktop() -> Self {
        Self::with_granted([Capability::Microphone, Capability::MediaLibrary])
    }

    /// Gate granting exactly the given capabilities.
    pub fn with_granted(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            granted: capabilities.into_iter().collect(),
        }
    }
}

impl PermissionGate for ImplicitPermissionGate {
    fn check_and_request(
        &mut self,
        capabilities: &[Capability],
    ) -> impl Future<Output = HashMap<Capability, PermissionState>> + Send {
        let grants: HashMap<Capability, PermissionState> = capabilities
            .iter()
            .map(|cap| {
                let state = if self.granted.contains(cap) {
                    PermissionState::Granted
                } else {
                    PermissionState::Denied
                };
                (*cap, state)
            })
            .collect();

        debug!(?grants, "Permission check");

        async move { grants }
    }
}
