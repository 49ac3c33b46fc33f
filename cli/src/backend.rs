//! HTTP client for the image-processing backend.
//!
//! Routes and bodies come from the `wire` crate; this module only knows how to
//! join them onto the configured base URL and move bytes.

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use wire::{AutoDetectResponse, CropRequest, CropResponse, Endpoint, HealthResponse, ImageInfo, Method};

use crate::error::CliError;

pub struct Backend {
    client: reqwest::Client,
    base: Url,
}

impl Backend {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, CliError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Absolute URL of `endpoint` under this backend.
    ///
    /// # Errors
    ///
    /// Fails when the base URL cannot carry a path.
    pub fn url(&self, endpoint: Endpoint<'_>) -> Result<Url, CliError> {
        endpoint_url(&self.base, endpoint)
    }

    pub async fn health(&self) -> Result<HealthResponse, CliError> {
        self.fetch_json(Endpoint::Health, None).await
    }

    pub async fn image_info(&self, filename: &str) -> Result<ImageInfo, CliError> {
        self.fetch_json(Endpoint::ImageInfo(filename), None).await
    }

    pub async fn auto_detect(&self, filename: &str) -> Result<AutoDetectResponse, CliError> {
        self.fetch_json(Endpoint::AutoDetect(filename), None).await
    }

    /// Submit the crop and return the backend's confirmation.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-2xx responses, a malformed body, or an
    /// invalid request.
    pub async fn crop(&self, filename: &str, request: &CropRequest) -> Result<CropResponse, CliError> {
        request.validate()?;
        let response: CropResponse = self.fetch_json(Endpoint::Crop(filename), Some(request)).await?;
        Ok(response.into_result()?)
    }

    /// Rendered preview of the crop, as encoded image bytes.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-2xx responses, or an invalid request.
    pub async fn preview(&self, filename: &str, request: &CropRequest) -> Result<Vec<u8>, CliError> {
        request.validate()?;
        self.send(Endpoint::Preview(filename), Some(request)).await
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
        body: Option<&CropRequest>,
    ) -> Result<T, CliError> {
        let bytes = self.send(endpoint, body).await?;
        Ok(wire::decode(&bytes)?)
    }

    async fn send(&self, endpoint: Endpoint<'_>, body: Option<&CropRequest>) -> Result<Vec<u8>, CliError> {
        let url = self.url(endpoint)?;
        debug!(%url, "backend request");

        let request = match endpoint.method() {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        let request = if let Some(json) = body { request.json(json) } else { request };

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(CliError::Status {
                endpoint: url.path().to_owned(),
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }
        info!(path = url.path(), status = status.as_u16(), len = bytes.len(), "backend response");
        Ok(bytes.to_vec())
    }
}

/// Join `endpoint`'s segments onto `base`, percent-encoding each one.
///
/// # Errors
///
/// Fails when `base` cannot carry a path (e.g. `mailto:`).
pub fn endpoint_url(base: &Url, endpoint: Endpoint<'_>) -> Result<Url, CliError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CliError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(endpoint.segments());
    Ok(url)
}

/// Best-effort message from an error body: `detail` or `error` when it is
/// JSON, the raw text otherwise.
#[must_use]
pub fn error_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return text.to_owned();
            }
        }
        return value.to_string();
    }
    let text = String::from_utf8_lossy(body).trim().to_owned();
    if text.is_empty() { "empty response body".to_owned() } else { text }
}
