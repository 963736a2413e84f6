use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::capture::{CaptureError, SlurpGrimSource, WaylandClipboard};
use crate::config::{Config, StorageTarget};
use crate::notification::{self, Urgency};
use crate::upload::{
    fetch::{HttpClient, ReqwestClient},
    history::HistoryLog,
    storage::S3Transport,
    tools::{Capabilities, ExifTool, PaplayPlayer, ZenityDialog},
};

/// Produces screenshot bytes (PNG).
#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

/// Reads and writes the clipboard.
pub trait ClipboardAccess: Send + Sync {
    fn mime_types(&self) -> Result<Vec<String>, CaptureError>;
    fn read(&self, mime_type: &str) -> Result<Vec<u8>, CaptureError>;
    fn read_text(&self) -> Result<String, CaptureError>;
    fn copy_text(&self, text: &str) -> Result<(), CaptureError>;
    fn copy_bytes(&self, data: &[u8], mime_type: &str) -> Result<(), CaptureError>;
}

/// Copies a local file to a key in the configured bucket.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, local_path: &Path, key: &str) -> Result<(), String>;
}

/// Shows a desktop notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &str, body: &str, urgency: Urgency) -> Result<(), String>;
}

/// Starts playing a sound without waiting for it to finish.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, sound: &Path, volume: f64);
}

/// Asks the user a yes/no question.
pub trait ConfirmDialog: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}

/// Removes EXIF and similar metadata from a file in place.
pub trait MetadataStripper: Send + Sync {
    fn strip(&self, path: &Path) -> Result<(), String>;
}

/// Bundle of collaborators used by the pipelines. Each one can be mocked in tests.
///
/// `dialog` and `stripper` are optional capabilities: `None` means the tool
/// was not found at startup and callers degrade instead of failing.
#[derive(Clone)]
pub struct UploadDependencies {
    pub screenshot: Arc<dyn ScreenshotSource>,
    pub clipboard: Arc<dyn ClipboardAccess>,
    pub transport: Arc<dyn Transport>,
    pub http: Arc<dyn HttpClient>,
    pub notifier: Arc<dyn Notifier>,
    pub sound: Arc<dyn SoundPlayer>,
    pub dialog: Option<Arc<dyn ConfirmDialog>>,
    pub stripper: Option<Arc<dyn MetadataStripper>>,
    pub history: HistoryLog,
}

impl UploadDependencies {
    /// Wires up the real collaborators, probing optional tools once.
    pub fn detect(config: &Config, target: &StorageTarget) -> anyhow::Result<Self> {
        let capabilities = Capabilities::probe();
        if !capabilities.exiftool {
            log::warn!("exiftool not found; metadata will not be stripped before upload");
        }
        if !capabilities.zenity {
            log::warn!("zenity not found; large uploads will proceed without confirmation");
        }

        Ok(Self {
            screenshot: Arc::new(SlurpGrimSource::default()),
            clipboard: Arc::new(WaylandClipboard),
            transport: Arc::new(S3Transport::from_target(target)?),
            http: Arc::new(ReqwestClient::new()?),
            notifier: Arc::new(DesktopNotifier),
            sound: Arc::new(PaplayPlayer),
            dialog: capabilities
                .zenity
                .then(|| Arc::new(ZenityDialog) as Arc<dyn ConfirmDialog>),
            stripper: capabilities
                .exiftool
                .then(|| Arc::new(ExifTool) as Arc<dyn MetadataStripper>),
            history: HistoryLog::new(config.upload.history_path()),
        })
    }

    /// Best-effort metadata strip; failures only warn.
    pub fn strip_metadata(&self, path: &Path) {
        let Some(stripper) = &self.stripper else {
            log::debug!("Skipping metadata strip for {}", path.display());
            return;
        };
        if let Err(e) = stripper.strip(path) {
            log::warn!("Failed to strip metadata from {}: {}", path.display(), e);
        }
    }

    /// Best-effort notification; failures only warn.
    pub async fn notify(&self, summary: &str, body: &str, urgency: Urgency) {
        if let Err(e) = self.notifier.notify(summary, body, urgency).await {
            log::warn!("Failed to send notification: {}", e);
        }
    }
}

struct DesktopNotifier;

#[async_trait]
impl ScreenshotSource for SlurpGrimSource {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        SlurpGrimSource::capture(self).await
    }
}

impl ClipboardAccess for WaylandClipboard {
    fn mime_types(&self) -> Result<Vec<String>, CaptureError> {
        WaylandClipboard::mime_types(self)
    }

    fn read(&self, mime_type: &str) -> Result<Vec<u8>, CaptureError> {
        WaylandClipboard::read(self, mime_type)
    }

    fn read_text(&self) -> Result<String, CaptureError> {
        WaylandClipboard::read_text(self)
    }

    fn copy_text(&self, text: &str) -> Result<(), CaptureError> {
        WaylandClipboard::copy_text(self, text)
    }

    fn copy_bytes(&self, data: &[u8], mime_type: &str) -> Result<(), CaptureError> {
        WaylandClipboard::copy_bytes(self, data, mime_type)
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, summary: &str, body: &str, urgency: Urgency) -> Result<(), String> {
        notification::send_notification(summary, body, urgency).await
    }
}
