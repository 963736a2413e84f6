//! The three entry pipelines: screenshot, explicit source, and clipboard.
//! All of them end in [`Uploader::upload`].

use std::path::PathBuf;

use crate::config::{Config, ConfigError, StorageTarget};

use super::clipboard_content::{self, preferred_image_type};
use super::dependencies::UploadDependencies;
use super::extension;
use super::fallback;
use super::orchestrator::Uploader;
use super::source;
use super::temp::TempSlot;
use super::types::{ClipboardDecision, ResolvedArtifact, UploadError, UploadResult};

/// Which pipeline a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Screenshot,
    Upload(String),
    Clipboard,
}

impl Mode {
    /// Picks the mode from the command-line flags.
    ///
    /// `--upload` and `--clipboard` are mutually exclusive; neither means screenshot.
    pub fn from_flags(upload: Option<String>, clipboard: bool) -> Result<Self, ConfigError> {
        match (upload, clipboard) {
            (Some(_), true) => Err(ConfigError::InvalidConfiguration(
                "--upload and --clipboard cannot be used together".to_string(),
            )),
            (Some(source), false) => Ok(Self::Upload(source)),
            (None, true) => Ok(Self::Clipboard),
            (None, false) => Ok(Self::Screenshot),
        }
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Published(UploadResult),
    /// The user backed out of the screenshot selection or it timed out.
    Aborted(String),
}

/// Exit status after a failure that went through the failure handler.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status for configuration and usage errors.
pub const EXIT_USAGE: u8 = 2;

/// Process exit status for a finished run.
///
/// Clean aborts and a declined large upload are not failures.
pub fn exit_code(result: &Result<PipelineOutcome, UploadError>) -> u8 {
    match result {
        Ok(_) | Err(UploadError::UploadCancelled) => 0,
        Err(_) => EXIT_FAILURE,
    }
}

/// One run of one pipeline. Owns the run's temporary file, which is removed
/// when the pipeline is dropped.
pub struct Pipeline<'a> {
    uploader: Uploader<'a>,
    temp: TempSlot,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, target: &'a StorageTarget, deps: &'a UploadDependencies) -> Self {
        Self {
            uploader: Uploader {
                config,
                target,
                deps,
            },
            temp: TempSlot::new(),
        }
    }

    /// Uses `temp` for temporary files instead of the system temp directory.
    pub fn with_temp_slot(mut self, temp: TempSlot) -> Self {
        self.temp = temp;
        self
    }

    /// Runs `mode` to completion.
    ///
    /// Errors have already been through the failure handler when this returns;
    /// the temporary file is still present while the handler runs.
    pub async fn run(mut self, mode: Mode) -> Result<PipelineOutcome, UploadError> {
        log::debug!("Running pipeline: {:?}", mode);
        let result = match mode {
            Mode::Screenshot => self.screenshot().await,
            Mode::Upload(input) => self.upload_source(&input).await,
            Mode::Clipboard => self.clipboard().await,
        };

        if let Err(err) = &result {
            let deps = self.uploader.deps;
            fallback::handle(err, deps, &self.uploader.config.sound).await;
        }
        result
    }

    async fn screenshot(&mut self) -> Result<PipelineOutcome, UploadError> {
        let image = match self.uploader.deps.screenshot.capture().await {
            Ok(image) => image,
            Err(e) if e.is_clean_abort() => {
                log::info!("{}", e);
                return Ok(PipelineOutcome::Aborted(e.to_string()));
            }
            Err(e) => return Err(UploadError::CaptureFailed(e.to_string())),
        };

        let path = self
            .temp
            .write(Some("png"), &image)
            .map_err(|e| UploadError::CaptureFailed(format!("failed to save screenshot: {}", e)))?;
        self.publish(ResolvedArtifact::temporary(path)).await
    }

    async fn upload_source(&mut self, input: &str) -> Result<PipelineOutcome, UploadError> {
        let source = source::classify_source(input);
        log::debug!("Classified {:?} as {:?}", input, source);
        let artifact = source::resolve(source, self.uploader.deps, &mut self.temp).await?;
        self.publish(artifact).await
    }

    async fn clipboard(&mut self) -> Result<PipelineOutcome, UploadError> {
        let deps = self.uploader.deps;
        let clipboard = &deps.clipboard;
        let mime_types = clipboard
            .mime_types()
            .map_err(|e| UploadError::CaptureFailed(e.to_string()))?;

        let text = if preferred_image_type(&mime_types).is_some() {
            None
        } else {
            Some(
                clipboard
                    .read_text()
                    .map_err(|e| UploadError::CaptureFailed(e.to_string()))?,
            )
        };

        let decision = clipboard_content::classify(&mime_types, text.as_deref())?;
        log::info!("Clipboard decision: {}", describe(&decision));

        let artifact = match decision {
            ClipboardDecision::UploadAsImage { mime_type } => {
                let data = clipboard
                    .read(&mime_type)
                    .map_err(|e| UploadError::CaptureFailed(e.to_string()))?;
                if data.is_empty() {
                    return Err(UploadError::EmptyClipboard);
                }
                let ext = extension::for_unknown_content_type(&mime_type);
                let path = self.dump(Some(&ext), &data)?;
                deps.strip_metadata(&path);
                ResolvedArtifact::temporary(path)
            }
            ClipboardDecision::UploadUrl(url) => {
                let source = source::classify_source(&url);
                source::resolve(source, deps, &mut self.temp).await?
            }
            ClipboardDecision::UploadAsLocalPath(path) => source::resolve_local(&path, deps)?,
            ClipboardDecision::UploadAsText(text) => {
                ResolvedArtifact::temporary(self.dump(Some("txt"), text.as_bytes())?)
            }
        };

        self.publish(artifact).await
    }

    fn dump(&mut self, extension: Option<&str>, data: &[u8]) -> Result<PathBuf, UploadError> {
        self.temp.write(extension, data).map_err(|e| {
            UploadError::CaptureFailed(format!("failed to save clipboard contents: {}", e))
        })
    }

    async fn publish(&self, artifact: ResolvedArtifact) -> Result<PipelineOutcome, UploadError> {
        self.uploader
            .upload(&artifact)
            .await
            .map(PipelineOutcome::Published)
    }
}

fn describe(decision: &ClipboardDecision) -> String {
    match decision {
        ClipboardDecision::UploadAsImage { mime_type } => format!("image ({mime_type})"),
        ClipboardDecision::UploadUrl(url) => format!("URL {url}"),
        ClipboardDecision::UploadAsLocalPath(path) => format!("file {}", path.display()),
        ClipboardDecision::UploadAsText(text) => format!("text ({} bytes)", text.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_screenshot() {
        assert_eq!(Mode::from_flags(None, false), Ok(Mode::Screenshot));
        assert_eq!(Mode::from_flags(None, true), Ok(Mode::Clipboard));
        assert_eq!(
            Mode::from_flags(Some("a.png".into()), false),
            Ok(Mode::Upload("a.png".into()))
        );
    }

    #[test]
    fn upload_and_clipboard_conflict() {
        assert!(matches!(
            Mode::from_flags(Some("a.png".into()), true),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }
}
