//! Remote persistence of finished posters.
//!
//! When the object store isn't configured a [`NullPublisher`] stands in and every
//! poster stays local.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::error::{PosterError, body_snippet};
use crate::files::{content_type_for, dotted_extension, unique_name};

/// Storage bucket posters are uploaded to.
pub const BUCKET: &str = "images";

/// Table the (quote, url) records go in.
pub const TABLE: &str = "quotes";

/// Persists a poster and returns its public URL, if there is a store.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// `Ok(None)` means there is nowhere to publish to.
    async fn publish(&self, quote: &str, image: &Path) -> Result<Option<String>, PosterError>;
}

/// Used when the store isn't configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(&self, _quote: &str, image: &Path) -> Result<Option<String>, PosterError> {
        debug!(
            "Object store not configured, keeping {} local",
            image.display()
        );
        Ok(None)
    }
}

#[derive(Deserialize, Debug)]
struct BucketEntry {
    name: String,
}

/// Uploads to Supabase storage and records the quote in a table.
pub struct SupabasePublisher {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl SupabasePublisher {
    /// `base_url` is the project URL, eg `https://abc.supabase.co`.
    pub fn new(client: reqwest::Client, base_url: &Url, key: &str) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    /// Public URL of an object in the poster bucket.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{BUCKET}/{key}",
            self.base_url
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
    }

    async fn check(resp: reqwest::Response, action: &str) -> Result<(), PosterError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let bytes = resp.bytes().await.unwrap_or_default();
        Err(PosterError::PublishFailure(format!(
            "{action} failed with {status}: {}",
            body_snippet(&bytes)
        )))
    }

    /// Creates the public poster bucket if it doesn't exist yet.
    pub async fn ensure_bucket(&self) -> Result<(), PosterError> {
        let resp = self
            .request(reqwest::Method::GET, "/storage/v1/bucket")
            .send()
            .await
            .map_err(|err| PosterError::PublishFailure(err.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| PosterError::PublishFailure(err.to_string()))?;
        if !status.is_success() {
            return Err(PosterError::PublishFailure(format!(
                "listing buckets failed with {status}: {}",
                body_snippet(&bytes)
            )));
        }
        let buckets: Vec<BucketEntry> = serde_json::from_slice(&bytes)
            .map_err(|err| PosterError::PublishFailure(format!("invalid bucket list: {err}")))?;
        if buckets.iter().any(|bucket| bucket.name == BUCKET) {
            return Ok(());
        }

        info!("Creating storage bucket {BUCKET}");
        let resp = self
            .request(reqwest::Method::POST, "/storage/v1/bucket")
            .json(&json!({"id": BUCKET, "name": BUCKET, "public": true}))
            .send()
            .await
            .map_err(|err| PosterError::PublishFailure(err.to_string()))?;
        Self::check(resp, "creating bucket").await
    }
}

#[async_trait]
impl Publisher for SupabasePublisher {
    async fn publish(&self, quote: &str, image: &Path) -> Result<Option<String>, PosterError> {
        let bytes = tokio::fs::read(image).await.map_err(|err| {
            PosterError::PublishFailure(format!("failed to read {}: {err}", image.display()))
        })?;
        let key = unique_name("", &dotted_extension(image));

        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/storage/v1/object/{BUCKET}/{key}"),
            )
            .header(CONTENT_TYPE, content_type_for(image))
            .body(bytes)
            .send()
            .await
            .map_err(|err| PosterError::PublishFailure(err.to_string()))?;
        Self::check(resp, "upload").await?;

        let url = self.public_url(&key);
        let resp = self
            .request(reqwest::Method::POST, &format!("/rest/v1/{TABLE}"))
            .header("Prefer", "return=minimal")
            .json(&json!({"quote": quote, "img_url": url}))
            .send()
            .await
            .map_err(|err| PosterError::PublishFailure(err.to_string()))?;
        Self::check(resp, "insert").await?;

        info!("Published poster to {url}");
        Ok(Some(url))
    }
}
