//! Test fixtures and fake pipeline stages.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use crate::background::BackgroundProvider;
use crate::error::PosterError;
use crate::files::unique_name;
use crate::publisher::Publisher;
use crate::quote::{QuoteRequest, QuoteSource};

/// Encodes a solid-colour PNG.
pub(crate) fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// File names in `dir`, sorted.
pub(crate) fn read_dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub(crate) struct FakeQuotes {
    quote: Option<String>,
    pub(crate) seen: Arc<Mutex<Vec<String>>>,
}

impl FakeQuotes {
    pub(crate) fn ok(quote: &str) -> Self {
        Self {
            quote: Some(quote.to_string()),
            seen: Arc::default(),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            quote: None,
            seen: Arc::default(),
        }
    }
}

#[async_trait]
impl QuoteSource for FakeQuotes {
    async fn generate_quote(&self, request: QuoteRequest<'_>) -> Result<String, PosterError> {
        let label = match request {
            QuoteRequest::Topic(topic) => format!("topic:{topic}"),
            QuoteRequest::Inspired => "inspired".to_string(),
        };
        self.seen.lock().expect("lock").push(label);
        self.quote
            .clone()
            .ok_or_else(|| PosterError::QuoteGeneration("upstream down".to_string()))
    }
}

pub(crate) struct FakeBackground {
    output_dir: Option<PathBuf>,
}

impl FakeBackground {
    /// Writes a 3:4 grey PNG into `output_dir`.
    pub(crate) fn ok(output_dir: &Path) -> Self {
        Self {
            output_dir: Some(output_dir.to_path_buf()),
        }
    }

    /// Fails like a response with neither `url` nor `b64_json`.
    pub(crate) fn malformed() -> Self {
        Self { output_dir: None }
    }
}

#[async_trait]
impl BackgroundProvider for FakeBackground {
    async fn generate_background(&self, _topic: &str) -> Result<PathBuf, PosterError> {
        let Some(dir) = &self.output_dir else {
            return Err(PosterError::MalformedProviderResponse(
                "{\"data\":[{}]}".to_string(),
            ));
        };
        let path = dir.join(unique_name("bg-", ".png"));
        std::fs::write(&path, png_bytes(96, 128, [120, 80, 40])).expect("write background");
        Ok(path)
    }
}

pub(crate) struct FixedPublisher(pub(crate) String);

#[async_trait]
impl Publisher for FixedPublisher {
    async fn publish(&self, _quote: &str, _image: &Path) -> Result<Option<String>, PosterError> {
        Ok(Some(self.0.clone()))
    }
}

pub(crate) struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, _quote: &str, _image: &Path) -> Result<Option<String>, PosterError> {
        Err(PosterError::PublishFailure("bucket unreachable".to_string()))
    }
}
