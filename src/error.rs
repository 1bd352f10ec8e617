//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, info};

/// Failures across the poster pipeline and its web surface.
#[derive(Debug)]
pub enum PosterError {
    /// The language-model call failed or returned nothing usable
    QuoteGeneration(String),
    /// The image generator call failed (transport, status or body)
    ImageProvider(String),
    /// The image generator answered with neither a URL nor a base64 payload
    MalformedProviderResponse(String),
    /// The bytes we got back don't decode as an image
    InvalidImagePayload(String),
    /// Rendering or saving the composed poster failed
    Composition(String),
    /// Uploading to or recording in the remote store failed
    PublishFailure(String),
    /// Startup configuration is unusable
    Config(String),
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl PosterError {
    /// HTTP status reported for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ImageProvider(_)
            | Self::MalformedProviderResponse(_)
            | Self::InvalidImagePayload(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::QuoteGeneration(_)
            | Self::Composition(_)
            | Self::PublishFailure(_)
            | Self::Config(_)
            | Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the failures of the background stage, where the quote is still useful.
    pub fn is_background_failure(&self) -> bool {
        matches!(
            self,
            Self::ImageProvider(_) | Self::MalformedProviderResponse(_) | Self::InvalidImagePayload(_)
        )
    }
}

impl std::fmt::Display for PosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuoteGeneration(msg) => write!(f, "Quote generation failed: {msg}"),
            Self::ImageProvider(msg) => write!(f, "Background request failed: {msg}"),
            Self::MalformedProviderResponse(msg) => {
                write!(f, "Cannot find image url or b64_json in background response: {msg}")
            }
            Self::InvalidImagePayload(msg) => write!(f, "Background image is not decodable: {msg}"),
            Self::Composition(msg) => write!(f, "Failed to compose poster: {msg}"),
            Self::PublishFailure(msg) => write!(f, "Failed to publish poster: {msg}"),
            Self::Config(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
        }
    }
}

impl std::error::Error for PosterError {}

impl From<std::io::Error> for PosterError {
    fn from(err: std::io::Error) -> Self {
        PosterError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for PosterError {
    fn from(err: axum::http::Error) -> Self {
        PosterError::InternalServerError(err.to_string())
    }
}

impl From<url::ParseError> for PosterError {
    fn from(err: url::ParseError) -> Self {
        PosterError::Config(err.to_string())
    }
}

impl IntoResponse for PosterError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match &self {
            PosterError::NotFound(what) => info!("404 {what}"),
            other => error!("{other}"),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Returns the first 200 characters of a response body for error messages.
pub(crate) fn body_snippet(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).chars().take(200).collect()
}
