//! Naming and typing of the files we write to the output directory.

use std::path::Path;

use chrono::Utc;
use rand::RngExt;
use rand::distr::Alphanumeric;

use crate::constants::STATIC_PREFIX;

const TOKEN_LENGTH: usize = 32;

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds a collision-free file name: `<prefix><unix seconds>-<random token><extension>`.
///
/// `extension` includes the leading dot, or is empty.
pub fn unique_name(prefix: &str, extension: &str) -> String {
    format!(
        "{prefix}{}-{}{extension}",
        Utc::now().timestamp(),
        random_token()
    )
}

/// Returns the extension of `path` with its leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Guesses a content type from the file extension, defaulting to PNG.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

/// Only plain file names are served: no separators, no dot files.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Site-relative path that serves a locally stored file.
pub fn local_reference(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{STATIC_PREFIX}{name}")
}
