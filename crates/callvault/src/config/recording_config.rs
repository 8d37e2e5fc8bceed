use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recording storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Directory finished recordings are written into.
    pub directory: PathBuf,
}
