//! Failure handling shared by all pipelines.

use std::fs;
use std::path::Path;

use crate::config::SoundConfig;
use crate::notification::Urgency;

use super::dependencies::UploadDependencies;
use super::extension;
use super::types::UploadError;

/// What the failure handler ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// The failed image was put on the clipboard instead of a URL.
    ImageCopied,
    /// Only a failure notification was shown.
    Notified,
}

/// Reports `err`: failure sound, then either the image-to-clipboard
/// fallback or a plain failure notification.
pub async fn handle(
    err: &UploadError,
    deps: &UploadDependencies,
    sound: &SoundConfig,
) -> FallbackOutcome {
    log::error!("{}", err);
    deps.sound.play(&sound.failure_sound, sound.volume);

    if let Some(image) = err.artifact().filter(|path| path.is_file()) {
        match copy_image(image, deps) {
            Ok(()) => {
                deps.notify(
                    err.title(),
                    &format!("{err}\nThe image was copied to the clipboard instead."),
                    Urgency::Failure,
                )
                .await;
                return FallbackOutcome::ImageCopied;
            }
            Err(e) => log::warn!("Clipboard fallback failed: {}", e),
        }
    }

    deps.notify(err.title(), &err.to_string(), Urgency::Failure)
        .await;
    FallbackOutcome::Notified
}

fn copy_image(path: &Path, deps: &UploadDependencies) -> Result<(), String> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = extension::content_type_for(extension::classify(&name))
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| format!("{} is not an image", path.display()))?;

    let data = fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    deps.clipboard
        .copy_bytes(&data, mime_type)
        .map_err(|e| e.to_string())
}
