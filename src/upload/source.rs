//! Turning user input into a local file: classification of the input string,
//! path checks, and resolution (downloading when needed).

use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::dependencies::UploadDependencies;
use super::fetch;
use super::temp::TempSlot;
use super::types::{PathLookup, ResolvedArtifact, UploadError, UploadSource};

/// Characters rejected in paths so names stay portable.
const UNSAFE_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '\\', '?', '*'];

static REMOTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("remote URL pattern is valid"));

/// Whether `input` is an http(s) URL without embedded whitespace.
pub fn is_remote_url(input: &str) -> bool {
    REMOTE_URL.is_match(input)
}

pub fn has_unsafe_chars(input: &str) -> bool {
    input.contains(UNSAFE_PATH_CHARS) || input.chars().any(char::is_control)
}

/// Decodes a `file://` URL into a path, or `None` if `input` is not one.
pub fn decode_file_url(input: &str) -> Option<PathBuf> {
    let rest = input.strip_prefix("file://")?;
    match url::Url::parse(input).ok().and_then(|url| url.to_file_path().ok()) {
        Some(path) => Some(path),
        // Hosts or malformed escapes: keep the raw path, decoding spaces only.
        None => Some(PathBuf::from(rest.replace("%20", " "))),
    }
}

/// Classifies a user-supplied source string.
pub fn classify_source(input: &str) -> UploadSource {
    let input = input.trim();
    if let Some(path) = decode_file_url(input) {
        UploadSource::FileUrl(path)
    } else if is_remote_url(input) {
        UploadSource::RemoteUrl(input.to_string())
    } else {
        UploadSource::LocalPath(expand_tilde(input))
    }
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Checks whether `input` names a usable local path.
///
/// A bare name must exist relative to the working directory; a name with a
/// separator only needs its parent directory to exist.
pub fn lookup_path(input: &str) -> PathLookup {
    let input = input.trim();
    if input.is_empty() || has_unsafe_chars(input) {
        return PathLookup::NotApplicable;
    }

    let path = expand_tilde(input);
    let has_separator = input.contains(MAIN_SEPARATOR);

    let usable = if has_separator {
        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => true,
            Some(parent) => parent.is_dir(),
            None => path.exists(),
        }
    } else {
        path.exists()
    };

    if usable {
        PathLookup::Found(path)
    } else {
        PathLookup::NotFound
    }
}

/// Resolves a classified source to a local file.
///
/// Local files get their metadata stripped in place; downloads are stripped
/// after they land in the temp slot.
pub async fn resolve(
    source: UploadSource,
    deps: &UploadDependencies,
    temp: &mut TempSlot,
) -> Result<ResolvedArtifact, UploadError> {
    match source {
        UploadSource::FileUrl(path) => resolve_local(&path, deps),
        UploadSource::RemoteUrl(url) => {
            let artifact = fetch::fetch(&url, deps.http.as_ref(), temp).await?;
            deps.strip_metadata(&artifact.local_path);
            Ok(artifact)
        }
        UploadSource::LocalPath(path) => {
            let raw = path.to_string_lossy();
            if has_unsafe_chars(&raw) {
                return Err(UploadError::NotFound(format!(
                    "{} contains characters that are not allowed in paths",
                    raw
                )));
            }
            match lookup_path(&raw) {
                PathLookup::Found(found) => resolve_local(&found, deps),
                PathLookup::NotFound | PathLookup::NotApplicable => {
                    Err(UploadError::NotFound(format!("{} does not exist", raw)))
                }
            }
        }
    }
}

/// Accepts an existing regular file as an upload artifact, stripping its metadata.
pub fn resolve_local(
    path: &Path,
    deps: &UploadDependencies,
) -> Result<ResolvedArtifact, UploadError> {
    if !path.is_file() {
        return Err(UploadError::NotFound(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    deps.strip_metadata(path);
    Ok(ResolvedArtifact::local(path.to_path_buf()))
}
