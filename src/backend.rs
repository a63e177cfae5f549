//! Backend contract: wire payloads, errors, and the HTTP client.
//!
//! The store serves image bytes plus metadata and previously saved
//! coordinates by image index, accepts coordinate saves, and expands drawn
//! rectangles into point sets. Everything crossing this boundary is in
//! image-space pixel coordinates; viewport state never leaks onto the wire.
//! [`Backend`] is the seam the session is generic over, so tests can swap
//! in an in-memory store.

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::marks::Mark;

/// Error surfaced by a backend operation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// GPS position and gimbal attitude extracted from the image metadata.
/// Every field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<f64>,
    #[serde(rename = "Altitude", default)]
    pub altitude: Option<f64>,
    #[serde(rename = "GimbalRoll", default)]
    pub gimbal_roll: Option<f64>,
    #[serde(rename = "GimbalPitch", default)]
    pub gimbal_pitch: Option<f64>,
    #[serde(rename = "GimbalYaw", default)]
    pub gimbal_yaw: Option<f64>,
}

/// Original pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Everything the backend knows about one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Base64-encoded image bytes; passed through to the renderer untouched.
    pub image_data: String,
    #[serde(default)]
    pub geo_info: GeoInfo,
    /// Opaque sidecar header, preserved verbatim across saves.
    #[serde(default)]
    pub header_lines: Vec<String>,
    /// Persisted marks; `null` is the "no marks" sentinel.
    #[serde(default)]
    pub coordinates: Vec<Option<Mark>>,
    pub original_dimensions: Dimensions,
}

/// Body of a coordinate save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    pub header_lines: Vec<String>,
    pub coordinates: Vec<Option<Mark>>,
}

/// The image/metadata store the session talks to.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Ordered image filenames. An empty list is valid and means "nothing
    /// to annotate".
    async fn list_images(&self) -> Result<Vec<String>, BackendError>;

    /// Full payload for the image at `index`.
    async fn fetch_image(&self, index: usize) -> Result<ImagePayload, BackendError>;

    /// Persist header lines and coordinates for the image at `index`.
    async fn save_coordinates(
        &self,
        index: usize,
        header_lines: &[String],
        coordinates: &[Option<Mark>],
    ) -> Result<(), BackendError>;

    /// Expand a drawn rectangle (image-space corners) into point marks.
    async fn process_rectangle(
        &self,
        corners: [[i32; 2]; 2],
    ) -> Result<Vec<[i32; 2]>, BackendError>;

    /// Ask the backend process to exit. Best effort.
    async fn shutdown(&self) -> Result<(), BackendError>;
}

/// HTTP implementation of [`Backend`] against the store's REST surface.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client: reqwest::Client::new(), base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Check the HTTP status and the body's `error` key, then deserialize.
    ///
    /// The store reports failures both ways: non-2xx statuses and, on some
    /// routes, a 200 with an `{"error": ...}` body.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        let error_message = body.get("error").and_then(Value::as_str).map(ToOwned::to_owned);
        if !status.is_success() || error_message.is_some() {
            let message = error_message.unwrap_or_else(|| body.to_string());
            return Err(BackendError::Status { status: status.as_u16(), message });
        }

        Ok(serde_json::from_value(body)?)
    }
}

impl Backend for HttpBackend {
    async fn list_images(&self) -> Result<Vec<String>, BackendError> {
        let response = self.client.get(self.url("/api/images")).send().await?;
        Self::read_json(response).await
    }

    async fn fetch_image(&self, index: usize) -> Result<ImagePayload, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/api/image/{index}")))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn save_coordinates(
        &self,
        index: usize,
        header_lines: &[String],
        coordinates: &[Option<Mark>],
    ) -> Result<(), BackendError> {
        let payload = SavePayload {
            header_lines: header_lines.to_vec(),
            coordinates: coordinates.to_vec(),
        };
        let response = self
            .client
            .post(self.url(&format!("/api/save_coordinates/{index}")))
            .json(&payload)
            .send()
            .await?;
        Self::read_json::<Value>(response).await?;
        Ok(())
    }

    async fn process_rectangle(
        &self,
        corners: [[i32; 2]; 2],
    ) -> Result<Vec<[i32; 2]>, BackendError> {
        let response = self
            .client
            .post(self.url("/api/process_rectangle"))
            .json(&serde_json::json!({ "rectangle": corners }))
            .send()
            .await?;
        // The extractor may hand back fractional centers; marks are pixels.
        let points: Vec<[f64; 2]> = Self::read_json(response).await?;
        Ok(points
            .into_iter()
            .map(|[x, y]| [x.round() as i32, y.round() as i32])
            .collect())
    }

    async fn shutdown(&self) -> Result<(), BackendError> {
        self.client
            .post(self.url("/shutdown"))
            .json(&serde_json::json!({ "action": "shutdown" }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
