use crate::config::{default_auto_upload, default_upload_field};

use serde::{Deserialize, Serialize};

/// Upload sink configuration. Upload is opt-in: with no endpoint the
/// finished recordings simply stay local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// HTTP endpoint accepting a multipart form with the audio file.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Multipart field name the endpoint expects.
    #[serde(default = "default_upload_field")]
    pub field_name: String,
    /// Whether to hand finished recordings to the sink automatically.
    #[serde(default = "default_auto_upload")]
    pub auto_upload: bool,
}
