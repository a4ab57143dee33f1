use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrbanPulseError {
    #[error("A transport must be provided to build the dashboard")]
    TransportNotDefined,

    #[error("A map engine must be provided to build the dashboard")]
    EngineNotDefined,

    #[error("Invalid API base URL '{0}': {1}")]
    InvalidBaseUrl(String, String),

    #[error("Failed to initialise HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Failures of a single backend call.
///
/// `Status` displays as the bare message so it can be shown to the user verbatim.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request to '{0}' failed: {1}")]
    Request(String, #[source] reqwest::Error),

    #[error("Failed to decode response from '{0}': {1}")]
    Decode(String, #[source] serde_json::Error),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    #[error("Source '{0}' not found on map")]
    SourceNotFound(String),

    #[error("Layer '{0}' not found on map")]
    LayerNotFound(String),

    #[error("Source '{0}' already exists")]
    DuplicateSource(String),

    #[error("Layer '{0}' already exists")]
    DuplicateLayer(String),

    #[error("Source '{0}' does not hold GeoJSON data")]
    NotGeoJsonSource(String),

    #[error("Paint property '{property}' is not supported by layer '{layer}'")]
    UnsupportedPaint { layer: String, property: String },

    #[error("Map instance has been removed")]
    Removed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("No camera selected.")]
    NoCameraSelected,

    #[error("A simulation is already running")]
    Busy,
}
