//! Data types shared by the upload pipelines.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where an upload request points, classified once from the user's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// A filesystem path (absolute, relative, or `~/`-prefixed).
    LocalPath(PathBuf),
    /// An `http://` or `https://` URL to download first.
    RemoteUrl(String),
    /// A `file://` URL, already decoded to a path.
    FileUrl(PathBuf),
}

/// Outcome of checking whether a string names a usable local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLookup {
    /// The string is a path we can work with.
    Found(PathBuf),
    /// The string looks like a path but nothing is there.
    NotFound,
    /// The string is not a path at all (unsafe characters, empty).
    NotApplicable,
}

/// A local file that is ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub local_path: PathBuf,
    /// Name the extension is derived from.
    pub original_name: String,
    pub extension: Option<String>,
    /// Whether the file was created by us and is owned by the temp slot.
    pub temporary: bool,
}

impl ResolvedArtifact {
    /// Wraps a file the user pointed at. The file is never deleted by us.
    pub fn local(path: PathBuf) -> Self {
        Self::new(path, false)
    }

    /// Wraps a file we created (download, clipboard dump, screenshot).
    pub fn temporary(path: PathBuf) -> Self {
        Self::new(path, true)
    }

    fn new(local_path: PathBuf, temporary: bool) -> Self {
        let original_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = super::extension::classify(&original_name).to_string();
        Self {
            local_path,
            original_name,
            extension: (!extension.is_empty()).then_some(extension),
            temporary,
        }
    }
}

/// A successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub public_url: String,
    pub size_bytes: u64,
    pub formatted_size: String,
}

/// What to do with the current clipboard contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardDecision {
    /// Dump the image under the given MIME type and upload it.
    UploadAsImage { mime_type: String },
    UploadUrl(String),
    UploadAsLocalPath(PathBuf),
    /// Upload the raw (untrimmed) text as a file.
    UploadAsText(String),
}

/// Failures that are routed through the failure handler.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Upload failed: {message}")]
    UploadFailed {
        message: String,
        /// The file that failed to publish, used for the clipboard fallback.
        artifact: Option<PathBuf>,
    },

    #[error("Upload cancelled")]
    UploadCancelled,

    #[error("Clipboard is empty")]
    EmptyClipboard,

    /// The screenshot tool or clipboard could not be read.
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
}

impl UploadError {
    pub fn upload_failed(message: impl Into<String>, artifact: &Path) -> Self {
        Self::UploadFailed {
            message: message.into(),
            artifact: Some(artifact.to_path_buf()),
        }
    }

    /// Short title used for the failure notification.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "File not found",
            Self::DownloadFailed(_) => "Download failed",
            Self::UploadFailed { .. } => "Upload failed",
            Self::UploadCancelled => "Upload cancelled",
            Self::EmptyClipboard => "Clipboard is empty",
            Self::CaptureFailed(_) => "Capture failed",
        }
    }

    /// The local artifact attached to the error, if any.
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            Self::UploadFailed { artifact, .. } => artifact.as_deref(),
            _ => None,
        }
    }
}
