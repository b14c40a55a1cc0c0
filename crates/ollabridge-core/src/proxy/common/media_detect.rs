//! Image signature detection for raw base64 payloads.
//!
//! Ollama clients send images as bare base64 strings; the upstream wants
//! self-describing data URLs. The encoding is classified from the leading
//! base64 text directly, without decoding.

use crate::error::{AppError, AppResult};
use tracing::debug;

/// Known base64 signature prefixes, checked in order. First match wins.
const SIGNATURES: [(&str, &str); 4] = [
    ("/9j/", "jpeg"),
    ("iVBOR", "png"),
    ("R0lGOD", "gif"),
    ("UklGR", "webp"),
];

/// Turn a raw base64 image payload into an embeddable data URL.
///
/// Already-prefixed input is returned unchanged, so repeated application
/// is idempotent. An unrecognized signature falls back to JPEG — the
/// detector never fails on non-empty input; worst case is a mislabeled
/// MIME type.
///
/// # Errors
///
/// Returns [`AppError::EmptyImage`] for empty or whitespace-only input.
/// Callers skip the image rather than abort the request.
pub fn image_data_url(raw: &str) -> AppResult<String> {
    let data = raw.trim();
    if data.is_empty() {
        return Err(AppError::EmptyImage);
    }

    if data.starts_with("data:image/") && data.contains(";base64,") {
        debug!("image already carries a data URL prefix");
        return Ok(data.to_string());
    }

    let kind = SIGNATURES
        .iter()
        .find(|(prefix, _)| data.starts_with(prefix))
        .map(|(_, kind)| *kind)
        .unwrap_or_else(|| {
            debug!("could not determine image type from signature, defaulting to jpeg");
            "jpeg"
        });

    Ok(format!("data:image/{};base64,{}", kind, data))
}
