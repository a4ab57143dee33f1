use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Metadata for one traffic camera as published by the camera feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CameraMeta {
    #[serde(rename = "CameraID")]
    pub camera_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_link: String,
}

/// The camera record sent with a simulation request.
///
/// Field names follow the backend's PascalCase contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CameraSelection {
    #[serde(rename = "CameraID")]
    pub camera_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_link: String,
    /// RFC 3339 time at which the camera was picked.
    pub timestamp: String,
}

impl CameraSelection {
    pub fn from_meta(meta: &CameraMeta, timestamp: impl Into<String>) -> Self {
        Self {
            camera_id: meta.camera_id.clone(),
            latitude: meta.latitude,
            longitude: meta.longitude,
            image_link: meta.image_link.clone(),
            timestamp: timestamp.into(),
        }
    }
}

/// `/data/cameras` answers either with a bare array or with the
/// `{ "value": [...] }` envelope of the upstream feed.
///
/// The shape is picked from the top-level JSON type first, so a malformed
/// camera reports its own field error.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraList {
    Envelope { value: Vec<CameraMeta> },
    Bare(Vec<CameraMeta>),
}

impl<'de> Deserialize<'de> for CameraList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(mut envelope) => {
                let value = envelope
                    .remove("value")
                    .ok_or_else(|| de::Error::missing_field("value"))?;
                serde_json::from_value(value)
                    .map(|value| CameraList::Envelope { value })
                    .map_err(|e| de::Error::custom(format!("invalid camera in 'value': {}", e)))
            }
            bare @ Value::Array(_) => serde_json::from_value(bare)
                .map(CameraList::Bare)
                .map_err(|e| de::Error::custom(format!("invalid camera: {}", e))),
            other => Err(de::Error::custom(format!(
                "expected a camera array or an object with 'value', found {}",
                other
            ))),
        }
    }
}

impl CameraList {
    pub fn into_cameras(self) -> Vec<CameraMeta> {
        match self {
            CameraList::Envelope { value } => value,
            CameraList::Bare(cameras) => cameras,
        }
    }
}
