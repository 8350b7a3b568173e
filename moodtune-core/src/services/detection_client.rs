//! Emotion classifier client
//!
//! Sends one face image to the external classifier and normalizes its answer.
//! Exactly one request per call: a misclassification is not fixed by asking again.
//!
//! Wire contract:
//! - `POST {detector_url}` multipart with an `image` file part, or JSON `{ "image": <data URL> }`
//! - success: `{ "emotion": string, "confidence"?: number }`
//! - failure: 4xx/5xx with `{ "error": string }`

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Label substituted when the classifier omits the emotion field
pub const UNKNOWN_EMOTION: &str = "Unknown";

const USER_AGENT: &str = concat!("MoodTune/", env!("CARGO_PKG_VERSION"));
const DEFAULT_FILE_NAME: &str = "capture.jpg";
const DEFAULT_MIME: &str = "image/jpeg";

/// Detection client errors
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Emotion detector timed out")]
    Timeout,

    #[error("Detector error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Image handed to the classifier
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw image file bytes (uploaded file)
    Bytes {
        data: Vec<u8>,
        file_name: Option<String>,
        content_type: Option<String>,
    },
    /// Still frame as a base64 data URL (`data:image/jpeg;base64,...`) or bare base64
    DataUrl(String),
}

impl ImageSource {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        ImageSource::Bytes {
            data,
            file_name: None,
            content_type: None,
        }
    }

    /// Build a source from whichever form the caller has
    ///
    /// A non-empty file wins over a data URL; neither is `InvalidInput`.
    pub fn from_parts(
        file: Option<Vec<u8>>,
        data_url: Option<String>,
    ) -> Result<Self, DetectionError> {
        match (file.filter(|d| !d.is_empty()), data_url.filter(|u| !u.trim().is_empty())) {
            (Some(data), _) => Ok(ImageSource::from_bytes(data)),
            (None, Some(url)) => Ok(ImageSource::DataUrl(url)),
            (None, None) => Err(DetectionError::InvalidInput(
                "Please upload an image or start the camera!".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::Bytes { .. } => "file",
            ImageSource::DataUrl(_) => "frame",
        }
    }

    /// Reject empty payloads and undecodable base64 before touching the network
    pub fn validate(&self) -> Result<(), DetectionError> {
        match self {
            ImageSource::Bytes { data, .. } if data.is_empty() => Err(
                DetectionError::InvalidInput("image file is empty".to_string()),
            ),
            ImageSource::Bytes { .. } => Ok(()),
            ImageSource::DataUrl(url) => {
                let payload = data_url_payload(url);
                if payload.is_empty() {
                    return Err(DetectionError::InvalidInput(
                        "image frame is empty".to_string(),
                    ));
                }
                base64::engine::general_purpose::STANDARD
                    .decode(payload)
                    .map(|_| ())
                    .map_err(|e| DetectionError::InvalidInput(format!("Invalid base64: {}", e)))
            }
        }
    }
}

/// Base64 payload of a data URL (everything after the first comma, if any)
pub fn data_url_payload(url: &str) -> &str {
    match url.split_once(',') {
        Some((_, payload)) => payload.trim(),
        None => url.trim(),
    }
}

/// Normalized classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Raw label; may be outside the canonical vocabulary
    pub emotion: String,
    /// Confidence in [0, 1], absent when the classifier gave nothing usable
    pub confidence: Option<f64>,
}

impl DetectionResult {
    pub fn new(emotion: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            emotion: emotion.into(),
            confidence,
        }
    }

    /// Normalize a classifier response body
    ///
    /// Missing/blank emotion becomes "Unknown"; a confidence that is not a finite number
    /// in [0, 1] is dropped.
    pub fn from_response(body: &Value) -> Self {
        let emotion = body
            .get("emotion")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(UNKNOWN_EMOTION)
            .to_string();

        let confidence = body
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite() && (0.0..=1.0).contains(c));

        Self {
            emotion,
            confidence,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.emotion == UNKNOWN_EMOTION
    }

    /// "87.5%"
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.1}%", c * 100.0))
    }
}

/// Anything that can turn an image into a detection result
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    async fn detect(&self, source: ImageSource) -> Result<DetectionResult, DetectionError>;
}

/// HTTP client for the external emotion classifier
pub struct DetectionClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl DetectionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DetectionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    fn build_request(&self, source: ImageSource) -> Result<reqwest::RequestBuilder, DetectionError> {
        let request = self.http_client.post(&self.endpoint);
        match source {
            ImageSource::Bytes {
                data,
                file_name,
                content_type,
            } => {
                let part = Part::bytes(data)
                    .file_name(file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()))
                    .mime_str(content_type.as_deref().unwrap_or(DEFAULT_MIME))
                    .map_err(|e| DetectionError::InvalidInput(format!("Bad content type: {}", e)))?;
                Ok(request.multipart(Form::new().part("image", part)))
            }
            ImageSource::DataUrl(url) => Ok(request.json(&serde_json::json!({ "image": url }))),
        }
    }
}

#[async_trait]
impl EmotionDetector for DetectionClient {
    async fn detect(&self, source: ImageSource) -> Result<DetectionResult, DetectionError> {
        source.validate()?;

        tracing::debug!(kind = source.kind(), endpoint = %self.endpoint, "Querying emotion detector");

        let response = self
            .build_request(source)?
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DetectionError::Timeout
                } else {
                    DetectionError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_error_message(&body);
            tracing::warn!(status = status.as_u16(), message = %message, "Emotion detector rejected request");
            return Err(DetectionError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                DetectionError::Timeout
            } else {
                DetectionError::ParseError(e.to_string())
            }
        })?;

        let result = DetectionResult::from_response(&body);
        tracing::info!(
            emotion = %result.emotion,
            confidence = ?result.confidence,
            "Emotion detected"
        );
        Ok(result)
    }
}

/// Pull `{ "error": "..." }` out of an error body, falling back to the raw text
pub(crate) fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error message".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
