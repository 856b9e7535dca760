//! Self-describing image payloads.
//!
//! Images attached to tasks are stored inline as data URLs
//! (`data:<mime>;base64,<data>`), the same shape a browser `FileReader`
//! produces, so a payload carries its own MIME type.

use std::fmt;
use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// MIME type assumed when a payload does not declare a usable one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// An inline image encoded as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Wrap an existing data URL without inspecting it.
    pub fn from_data_url(url: impl Into<String>) -> Self {
        ImagePayload(url.into())
    }

    /// Build a payload from a MIME type and base64 data.
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        ImagePayload(format!("data:{};base64,{}", mime_type, data))
    }

    /// Build a payload from raw image bytes.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, &STANDARD.encode(bytes))
    }

    /// Read an image file from disk, guessing its MIME type from the extension.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(guess_mime_type(path), &bytes))
    }

    /// The full data URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type declared in the header, or [`DEFAULT_MIME_TYPE`].
    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .map(|(header, _)| header.split(';').next().unwrap_or(""))
            .filter(|mime| is_valid_mime(mime))
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    /// The encoded body after the first comma. Empty if the URL has none.
    pub fn base64_data(&self) -> &str {
        self.0.split_once(',').map(|(_, data)| data).unwrap_or("")
    }

    /// Decode the body into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.base64_data())
    }

    /// Approximate decoded size in bytes, without decoding.
    pub fn approx_size(&self) -> usize {
        let data = self.base64_data().trim_end_matches('=');
        data.len() * 3 / 4
    }
}

impl fmt::Display for ImagePayload {
    /// Short human-readable summary, never the payload itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.approx_size();
        if size >= 1024 * 1024 {
            write!(f, "{} image, {:.1} MB", self.mime_type(), size as f64 / (1024.0 * 1024.0))
        } else if size >= 1024 {
            write!(f, "{} image, {} KB", self.mime_type(), size / 1024)
        } else {
            write!(f, "{} image, {} B", self.mime_type(), size)
        }
    }
}

/// `type/subtype` where both halves are non-empty and the type is alphanumeric.
fn is_valid_mime(mime: &str) -> bool {
    match mime.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && kind.chars().all(|c| c.is_ascii_alphanumeric())
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '+'))
        }
        None => false,
    }
}

/// Guess an image MIME type from a file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        _ => DEFAULT_MIME_TYPE,
    }
}
