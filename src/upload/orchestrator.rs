//! The single publish path every pipeline ends in.

use std::fs::File;

use crate::config::{Config, StorageTarget};
use crate::notification::Urgency;

use super::dependencies::UploadDependencies;
use super::naming::{format_size, random_filename};
use super::types::{ResolvedArtifact, UploadError, UploadResult};

/// Publishes resolved artifacts under a random public name.
pub struct Uploader<'a> {
    pub config: &'a Config,
    pub target: &'a StorageTarget,
    pub deps: &'a UploadDependencies,
}

impl Uploader<'_> {
    /// Uploads `artifact` under a random name keeping its extension, then
    /// records the public URL, announces it and copies it to the clipboard.
    ///
    /// Files above the confirmation threshold need a yes from the dialog when
    /// one is available; without a dialog the upload goes ahead.
    pub async fn upload(&self, artifact: &ResolvedArtifact) -> Result<UploadResult, UploadError> {
        let path = &artifact.local_path;

        let key = random_filename(
            self.config.upload.filename_length,
            artifact.extension.as_deref(),
        );

        let size_bytes = File::open(path)
            .and_then(|file| file.metadata())
            .map_err(|e| UploadError::NotFound(format!("cannot read {}: {}", path.display(), e)))?
            .len();
        let formatted_size = format_size(size_bytes);

        if size_bytes > self.config.upload.confirm_threshold_bytes {
            self.confirm_large_upload(artifact, &formatted_size)?;
        }

        log::info!(
            "Uploading {} ({}) as {}",
            path.display(),
            formatted_size,
            key
        );
        self.deps
            .transport
            .publish(path, &key)
            .await
            .map_err(|message| UploadError::upload_failed(message, path))?;

        let public_url = format!("{}/{}", self.target.url_base, key);
        log::info!("Published {} ({})", public_url, formatted_size);

        if let Err(e) = self.deps.history.append(&public_url, &formatted_size) {
            log::warn!("Failed to record upload history: {:#}", e);
        }

        self.deps
            .sound
            .play(&self.config.sound.success_sound, self.config.sound.volume);
        self.deps
            .notify(
                "Upload complete",
                &format!("{public_url}\n{formatted_size}"),
                Urgency::Success,
            )
            .await;

        if let Err(e) = self.deps.clipboard.copy_text(&public_url) {
            log::warn!("Failed to copy URL to clipboard: {}", e);
        }

        Ok(UploadResult {
            public_url,
            size_bytes,
            formatted_size,
        })
    }

    fn confirm_large_upload(
        &self,
        artifact: &ResolvedArtifact,
        formatted_size: &str,
    ) -> Result<(), UploadError> {
        let Some(dialog) = &self.deps.dialog else {
            log::warn!(
                "{} is {} but no confirmation dialog is available; uploading anyway",
                artifact.local_path.display(),
                formatted_size
            );
            return Ok(());
        };

        let question = format!(
            "{} is {}. Upload it anyway?",
            artifact.original_name, formatted_size
        );
        if dialog.confirm(&question) {
            Ok(())
        } else {
            log::info!("Large upload of {} declined", artifact.local_path.display());
            Err(UploadError::UploadCancelled)
        }
    }
}
