//! Device status lookups against the io.solutions worker API

use crate::config::Config;
use crate::errors::{CheckFailure, MonitorError, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

/// Outer status value that marks a successful lookup
pub const SUCCEEDED: &str = "succeeded";

/// Device status that counts as healthy
pub const UP: &str = "up";

/// Body returned by the device details endpoint
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<DeviceDetails>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DeviceDetails {
    #[serde(default)]
    pub status: Option<String>,
}

/// Result of a lookup that returned a usable body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Normal { status: Option<String> },
    Anomalous { status: String },
}

/// Classify a decoded status body
///
/// Only a literal `"succeeded"` outer status is evaluated; anything else is
/// reported as normal with whatever inner status came back.
pub fn classify(device_id: &str, response: StatusResponse) -> Result<CheckOutcome> {
    let inner = response.data.and_then(|details| details.status);

    if response.status.as_deref() != Some(SUCCEEDED) {
        return Ok(CheckOutcome::Normal { status: inner });
    }

    match inner {
        Some(status) if status == UP => Ok(CheckOutcome::Normal {
            status: Some(status),
        }),
        Some(status) => Ok(CheckOutcome::Anomalous { status }),
        None => Err(MonitorError::CheckRequest {
            device_id: device_id.to_string(),
            reason: CheckFailure::Malformed("missing data.status".to_string()),
        }),
    }
}

/// HTTP client for the device status API
#[derive(Debug, Clone)]
pub struct StatusChecker {
    client: Client,
    base_url: Url,
    api_token: String,
}

impl StatusChecker {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(format!("device_watch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        let base_url = Url::parse(&config.status_api_url).map_err(|e| {
            MonitorError::Config(format!(
                "invalid status_api_url {}: {}",
                config.status_api_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MonitorError::Config(format!(
                "status_api_url {} cannot be used as a base URL",
                config.status_api_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    /// Details URL for one device; the id is escaped as a single path segment
    pub fn details_url(&self, device_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "io-worker", "devices", device_id, "details"]);
        }
        url
    }

    /// Fetch and classify the status of one device
    pub async fn check(&self, device_id: &str) -> Result<CheckOutcome> {
        let response = self.fetch(device_id).await?;
        classify(device_id, response)
    }

    /// Fetch the raw status body of one device
    pub async fn fetch(&self, device_id: &str) -> Result<StatusResponse> {
        let url = self.details_url(device_id);
        debug!("Requesting status for device {} from {}", device_id, url);

        let failed = |reason| MonitorError::CheckRequest {
            device_id: device_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header("token", &self.api_token)
            .send()
            .await
            .map_err(|e| failed(CheckFailure::Transport(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| failed(CheckFailure::Transport(e)))?;

        if !status.is_success() {
            return Err(failed(CheckFailure::HttpStatus {
                status: status.as_u16(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| failed(CheckFailure::Malformed(e.to_string())))
    }
}
