//! Extension classification for filenames, plus the MIME mappings used when a
//! name carries no extension of its own.

/// Compound archive suffixes, checked before the plain last-dot rule.
/// Long forms come before their short aliases; within a family the more
/// specific suffix comes first.
const COMPOUND_EXTENSIONS: &[&str] = &[
    "tar.gz", "tgz", "tar.xz", "txz", "tar.bz2", "tbz2", "tar.zst", "tzst", "tar.lzma", "tlzma",
    "tar.lz", "tlz",
];

/// Derives the extension of `filename`, or `""` when it has none we trust.
///
/// Compound archive suffixes are returned whole (`archive.tar.gz` → `tar.gz`).
/// Otherwise the text after the last `.` is used if it is alphanumeric.
/// The returned slice keeps the filename's original casing.
pub fn classify(filename: &str) -> &str {
    let lower = filename.to_ascii_lowercase();
    for compound in COMPOUND_EXTENSIONS {
        let dotted_len = compound.len() + 1;
        if lower.len() > dotted_len
            && lower.ends_with(compound)
            && lower.as_bytes()[lower.len() - dotted_len] == b'.'
        {
            return &filename[filename.len() - compound.len()..];
        }
    }

    match filename.rfind('.') {
        Some(idx) => {
            let candidate = &filename[idx + 1..];
            if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
                candidate
            } else {
                ""
            }
        }
        None => "",
    }
}

/// Maps a `Content-Type` header value to an extension.
///
/// Parameters such as `; charset=...` are ignored.
pub fn for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/gif" => Some("gif"),
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        "image/svg+xml" => Some("svg"),
        "video/mp4" => Some("mp4"),
        "text/plain" => Some("txt"),
        _ => None,
    }
}

/// Best-effort extension for a content type outside the fixed table:
/// the MIME subtype when it is a plain word, otherwise `bin`.
///
/// The subtype is preferred over the URL's own trailing segment, which by
/// the time this is called is known not to hold a usable extension.
pub fn for_unknown_content_type(content_type: &str) -> String {
    if let Some(known) = for_content_type(content_type) {
        return known.to_string();
    }
    content_type
        .split(';')
        .next()
        .and_then(|essence| essence.trim().rsplit('/').next())
        .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}

/// Content type to publish a file under, when the extension is a known one.
pub fn content_type_for(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "gif" => Some("image/gif"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "txt" | "log" => Some("text/plain; charset=utf-8"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
