mod config;
mod recording_config;
mod upload_config;

pub(crate) use {
    config::Config, recording_config::RecordingConfig, upload_config::UploadConfig,
};

pub(crate) const DEFAULT_UPLOAD_FIELD: &str = "audio";
pub(crate) const DEFAULT_AUTO_UPLOAD: bool = false;

pub(crate) fn default_upload_field() -> String {
    DEFAULT_UPLOAD_FIELD.to_string()
}

pub(crate) fn default_auto_upload() -> bool {
    DEFAULT_AUTO_UPLOAD
}
