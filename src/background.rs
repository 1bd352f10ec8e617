//! Background image generation.
//!
//! The generator may answer with a hosted URL or an inline base64 payload, either at
//! the top level (`{"url": ...}`) or in the first entry of `data`. Both are normalized
//! into a single decodable file in the output directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::constants::BACKGROUND_ASPECT_RATIO;
use crate::error::{PosterError, body_snippet};
use crate::files::unique_name;

/// Produces a textless background for a topic, stored locally.
#[async_trait]
pub trait BackgroundProvider: Send + Sync {
    /// Returns the path of the decodable background image.
    async fn generate_background(&self, topic: &str) -> Result<PathBuf, PosterError>;
}

/// Where the image lives in a generator response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImagePayload {
    /// Hosted image, needs a follow-up download
    Url(String),
    /// Inline base64-encoded image
    Base64(String),
    /// Neither field is present
    Unrecognized,
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

impl ImagePayload {
    /// Classifies a response body. URLs win over base64 when both are present.
    pub fn classify(body: &Value) -> Self {
        if let Some(url) = non_empty_str(body, "url") {
            return Self::Url(url.to_string());
        }
        let Some(first) = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|data| data.first())
        else {
            return Self::Unrecognized;
        };
        if let Some(url) = non_empty_str(first, "url") {
            Self::Url(url.to_string())
        } else if let Some(b64) = non_empty_str(first, "b64_json") {
            Self::Base64(b64.to_string())
        } else {
            Self::Unrecognized
        }
    }
}

/// Request body for the image generation endpoint.
#[derive(Serialize, Debug)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    aspect_ratio: &'a str,
    output_format: &'a str,
    safety_tolerance: u8,
    prompt_upsampling: bool,
}

fn background_prompt(topic: &str) -> String {
    format!(
        "Abstract dark gradient or subtle texture background with objects as decorations inspired by {topic}. \
No words, no text, high-resolution, cinematic lighting."
    )
}

/// [`BackgroundProvider`] for Flux-style image generation endpoints.
pub struct FluxBackgroundProvider {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    output_dir: PathBuf,
}

impl FluxBackgroundProvider {
    /// Backgrounds are written into `output_dir`.
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        api_key: &str,
        model: &str,
        output_dir: &Path,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            model: model.to_string(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PosterError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PosterError::ImageProvider(format!("failed to download image: {err}")))?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            PosterError::ImageProvider(format!("failed to read downloaded image: {err}"))
        })?;
        if !status.is_success() {
            return Err(PosterError::ImageProvider(format!(
                "image download error {status}"
            )));
        }
        Ok(bytes.to_vec())
    }

    /// Keeps downloaded bytes as-is, named after their real format.
    async fn store_download(&self, bytes: Vec<u8>) -> Result<PathBuf, PosterError> {
        let (bytes, extension) = run_blocking(move || {
            let format = image::guess_format(&bytes)
                .map_err(|err| PosterError::InvalidImagePayload(err.to_string()))?;
            image::load_from_memory_with_format(&bytes, format)
                .map_err(|err| PosterError::InvalidImagePayload(err.to_string()))?;
            let extension = format.extensions_str().first().copied().unwrap_or("png");
            Ok((bytes, extension))
        })
        .await?;
        let path = self
            .output_dir
            .join(unique_name("bg-", &format!(".{extension}")));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Decodes an inline payload and re-encodes it as PNG.
    async fn store_inline(&self, b64: String) -> Result<PathBuf, PosterError> {
        let path = self.output_dir.join(unique_name("bg-", ".png"));
        run_blocking(move || {
            let bytes = general_purpose::STANDARD
                .decode(b64.trim())
                .map_err(|err| PosterError::InvalidImagePayload(format!("bad base64: {err}")))?;
            let image = image::load_from_memory(&bytes)
                .map_err(|err| PosterError::InvalidImagePayload(err.to_string()))?;
            image
                .save_with_format(&path, image::ImageFormat::Png)
                .map_err(|err| PosterError::InternalServerError(err.to_string()))?;
            Ok(path)
        })
        .await
    }
}

/// Runs image decoding and encoding off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, PosterError>
where
    F: FnOnce() -> Result<T, PosterError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PosterError::InternalServerError(format!("image task failed: {err}")))?
}

#[async_trait]
impl BackgroundProvider for FluxBackgroundProvider {
    async fn generate_background(&self, topic: &str) -> Result<PathBuf, PosterError> {
        let prompt = background_prompt(topic);
        let req_body = ImageGenerationRequest {
            model: &self.model,
            prompt: &prompt,
            aspect_ratio: BACKGROUND_ASPECT_RATIO,
            output_format: "png",
            safety_tolerance: 2,
            prompt_upsampling: false,
        };
        debug!("Requesting background for topic {topic}");

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&req_body)
            .send()
            .await
            .map_err(|err| PosterError::ImageProvider(err.to_string()))?;
        let status = resp.status();
        let resp_bytes = resp
            .bytes()
            .await
            .map_err(|err| PosterError::ImageProvider(format!("failed reading body: {err}")))?;
        if !status.is_success() {
            return Err(PosterError::ImageProvider(format!(
                "API error {status}: {}",
                body_snippet(&resp_bytes)
            )));
        }
        let body: Value = serde_json::from_slice(&resp_bytes).map_err(|err| {
            PosterError::ImageProvider(format!(
                "invalid JSON ({err}): {}",
                body_snippet(&resp_bytes)
            ))
        })?;

        let path = match ImagePayload::classify(&body) {
            ImagePayload::Url(url) => {
                let bytes = self.download(&url).await?;
                self.store_download(bytes).await?
            }
            ImagePayload::Base64(b64) => self.store_inline(b64).await?,
            ImagePayload::Unrecognized => {
                return Err(PosterError::MalformedProviderResponse(body_snippet(
                    &resp_bytes,
                )));
            }
        };
        info!("Saved background {}", path.display());
        Ok(path)
    }
}
