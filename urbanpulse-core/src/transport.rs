//! Turns dashboard intents into HTTP calls against the UrbanPulse backend.
//!
//! Every operation is a single request/response: no retry, no timeout, no cache.

use crate::error::{TransportError, UrbanPulseError};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::env;
use tracing::debug;
use urbanpulse_schemas::{
    camera::{CameraList, CameraMeta},
    geojson::FeatureCollection,
    simulation::{SimulationRequest, SimulationResponse},
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const API_URL_ENV: &str = "URBANPULSE_API_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Traffic,
    Aqi,
    Weather,
    Cameras,
    Simulate,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Status => "/status",
            Endpoint::Traffic => "/data/traffic",
            Endpoint::Aqi => "/data/aqi",
            Endpoint::Weather => "/data/weather",
            Endpoint::Cameras => "/data/cameras",
            Endpoint::Simulate => "/simulate",
        }
    }

    /// Used as the error message when a failed response carries no body.
    pub fn failure_message(self) -> &'static str {
        match self {
            Endpoint::Status => "Failed to fetch status",
            Endpoint::Traffic => "Failed to fetch traffic data",
            Endpoint::Aqi => "Failed to fetch AQI data",
            Endpoint::Weather => "Failed to fetch weather data",
            Endpoint::Cameras => "Failed to fetch camera list",
            Endpoint::Simulate => "Simulation failed",
        }
    }
}

/// The backend operations the dashboard depends on.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn status(&self) -> Result<Value, TransportError>;
    async fn traffic(&self) -> Result<FeatureCollection, TransportError>;
    async fn aqi(&self) -> Result<FeatureCollection, TransportError>;
    async fn weather(&self) -> Result<Value, TransportError>;
    async fn cameras(&self) -> Result<Vec<CameraMeta>, TransportError>;
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, UrbanPulseError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed)
            .map_err(|e| UrbanPulseError::InvalidBaseUrl(base_url.to_string(), e.to_string()))?;
        let client = Client::builder().build().map_err(UrbanPulseError::HttpClient)?;
        Ok(Self {
            client,
            base_url: trimmed.to_string(),
        })
    }

    /// Reads the base URL from `URBANPULSE_API_URL`, falling back to the local default.
    pub fn from_env() -> Result<Self, UrbanPulseError> {
        let base_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, TransportError> {
        let url = self.url(endpoint);
        debug!(endpoint = endpoint.path(), "GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Request(endpoint.path().to_string(), e))?;
        decode(endpoint, response).await
    }
}

async fn decode<T: DeserializeOwned>(endpoint: Endpoint, response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::Request(endpoint.path().to_string(), e))?;

    if !status.is_success() {
        let message = if body.trim().is_empty() {
            endpoint.failure_message().to_string()
        } else {
            body
        };
        return Err(TransportError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| TransportError::Decode(endpoint.path().to_string(), e))
}

impl Transport for HttpTransport {
    async fn status(&self) -> Result<Value, TransportError> {
        self.get(Endpoint::Status).await
    }

    async fn traffic(&self) -> Result<FeatureCollection, TransportError> {
        self.get(Endpoint::Traffic).await
    }

    async fn aqi(&self) -> Result<FeatureCollection, TransportError> {
        self.get(Endpoint::Aqi).await
    }

    async fn weather(&self) -> Result<Value, TransportError> {
        self.get(Endpoint::Weather).await
    }

    async fn cameras(&self) -> Result<Vec<CameraMeta>, TransportError> {
        let list: CameraList = self.get(Endpoint::Cameras).await?;
        Ok(list.into_cameras())
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse, TransportError> {
        let endpoint = Endpoint::Simulate;
        let url = self.url(endpoint);
        debug!(
            endpoint = endpoint.path(),
            vehicle_reduction = request.vehicle_reduction,
            cameras = request.cameras.len(),
            "POST {}",
            url
        );
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(endpoint.path().to_string(), e))?;
        decode(endpoint, response).await
    }
}
