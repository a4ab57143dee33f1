use crate::camera::CameraMeta;
use serde::Deserialize;

/// An offline camera catalog, used when the backend exposes no camera feed.
#[derive(Debug, Deserialize)]
pub struct CameraFile {
    pub schema_version: String,
    pub cameras: Vec<CameraMeta>,
}

/// Dashboard settings read from `--config`. Every field is optional so a file
/// may override only part of the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardFile {
    pub api_url: Option<String>,
    pub sequencing: Option<String>,
    pub cameras_file: Option<String>,
}
