//! Deciding what to upload from whatever is on the clipboard.

use super::source::{decode_file_url, is_remote_url, lookup_path};
use super::types::{ClipboardDecision, PathLookup, UploadError};

/// Picks the image type to dump: `image/png` if offered, otherwise the first
/// `image/*` type in sorted order.
pub fn preferred_image_type(mime_types: &[String]) -> Option<&str> {
    if mime_types.iter().any(|t| t == "image/png") {
        return Some("image/png");
    }
    let mut images: Vec<&str> = mime_types
        .iter()
        .map(String::as_str)
        .filter(|t| t.starts_with("image/"))
        .collect();
    images.sort_unstable();
    images.first().copied()
}

/// Classifies clipboard contents.
///
/// An offered image type wins over any text. `text` is only consulted when
/// no image is present and must then be the clipboard's text content.
pub fn classify(
    mime_types: &[String],
    text: Option<&str>,
) -> Result<ClipboardDecision, UploadError> {
    if let Some(mime_type) = preferred_image_type(mime_types) {
        return Ok(ClipboardDecision::UploadAsImage {
            mime_type: mime_type.to_string(),
        });
    }

    let raw = text.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UploadError::EmptyClipboard);
    }

    if is_remote_url(trimmed) {
        return Ok(ClipboardDecision::UploadUrl(trimmed.to_string()));
    }

    if let Some(path) = decode_file_url(trimmed)
        && path.is_file()
    {
        return Ok(ClipboardDecision::UploadAsLocalPath(path));
    }

    if let PathLookup::Found(path) = lookup_path(trimmed) {
        return Ok(ClipboardDecision::UploadAsLocalPath(path));
    }

    Ok(ClipboardDecision::UploadAsText(raw.to_string()))
}
