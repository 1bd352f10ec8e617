//! Serves generated images from the output directory.

use std::io::ErrorKind;
use std::path::Path as StdPath;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{
    CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use httpdate::{fmt_http_date, parse_http_date};

use super::AppState;
use crate::constants::IMAGE_CACHE_CONTROL;
use crate::error::PosterError;
use crate::files::{content_type_for, is_safe_filename};

/// Cache headers derived from image metadata.
#[derive(Clone, Debug)]
pub(crate) struct ImageCacheHeaders {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl ImageCacheHeaders {
    /// Builds cache headers from filesystem metadata.
    pub(crate) fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified_at = metadata.modified().ok();
        let etag = build_etag(metadata.len(), modified_at);
        let last_modified =
            modified_at.and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok());
        Self {
            etag,
            last_modified,
            modified_at,
        }
    }
}

/// Applies image cache headers to a response builder.
fn apply_cache_headers(mut builder: Builder, cache: &ImageCacheHeaders) -> Builder {
    builder = builder.header(CACHE_CONTROL, IMAGE_CACHE_CONTROL.as_str());
    if let Some(etag) = &cache.etag {
        builder = builder.header(ETAG, etag.clone());
    }
    if let Some(last_modified) = &cache.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified.clone());
    }
    builder
}

/// Returns true when the request matches a not-modified response.
pub(crate) fn is_not_modified(headers: &HeaderMap, cache: &ImageCacheHeaders) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        let Ok(value) = if_none_match.to_str() else {
            return false;
        };
        let value = value.trim();
        if value == "*" {
            return true;
        }
        return cache
            .etag
            .as_ref()
            .and_then(|etag| etag.to_str().ok())
            .is_some_and(|etag| value.split(',').any(|candidate| candidate.trim() == etag));
    }

    if let (Some(if_modified_since), Some(modified_at)) =
        (headers.get(IF_MODIFIED_SINCE), cache.modified_at)
        && let Ok(value) = if_modified_since.to_str()
        && let Ok(since) = parse_http_date(value)
    {
        // http dates have second precision
        let modified_secs = modified_at
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or_default();
        let since_secs = since
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or_default();
        return modified_secs <= since_secs;
    }

    false
}

fn build_etag(size: u64, modified_at: Option<SystemTime>) -> Option<HeaderValue> {
    let suffix = match modified_at {
        Some(modified) => modified
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs().to_string())
            .unwrap_or_else(|_| "0".to_string()),
        None => "0".to_string(),
    };
    HeaderValue::from_str(&format!("W/\"{}-{}\"", size, suffix)).ok()
}

async fn read_output_file(
    output_dir: &StdPath,
    filename: &str,
    headers: &HeaderMap,
) -> Result<Response, PosterError> {
    let path = output_dir.join(filename);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(PosterError::NotFound(filename.to_string())),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(PosterError::NotFound(filename.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    let cache = ImageCacheHeaders::from_metadata(&metadata);
    if is_not_modified(headers, &cache) {
        return apply_cache_headers(Response::builder().status(StatusCode::NOT_MODIFIED), &cache)
            .body(Body::empty())
            .map_err(PosterError::from);
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(PosterError::NotFound(filename.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    apply_cache_headers(Response::builder(), &cache)
        .header(CONTENT_TYPE, content_type_for(&path))
        .body(Body::from(bytes))
        .map_err(PosterError::from)
}

/// handles GET /static/{filename}
pub(crate) async fn static_file_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> Result<Response, PosterError> {
    if !is_safe_filename(&filename) {
        return Err(PosterError::NotFound(filename));
    }
    read_output_file(&state.output_dir, &filename, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_for(path: &StdPath) -> ImageCacheHeaders {
        ImageCacheHeaders::from_metadata(&std::fs::metadata(path).expect("metadata"))
    }

    #[test]
    fn etag_and_date_matching() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.png");
        std::fs::write(&file, b"1234").expect("write");
        let cache = cache_for(&file);
        let etag = cache.etag.clone().expect("etag");
        assert!(etag.to_str().expect("ascii").starts_with("W/\"4-"));

        let mut headers = HeaderMap::new();
        assert!(!is_not_modified(&headers, &cache));

        headers.insert(IF_NONE_MATCH, etag.clone());
        assert!(is_not_modified(&headers, &cache));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"other\""));
        assert!(!is_not_modified(&headers, &cache));

        let mut headers = HeaderMap::new();
        headers.insert(
            IF_MODIFIED_SINCE,
            cache.last_modified.clone().expect("last modified"),
        );
        assert!(is_not_modified(&headers, &cache));
    }
}
