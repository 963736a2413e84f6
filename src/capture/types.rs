//! Error type for screenshot and clipboard collaborators.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while capturing a screenshot or talking to the clipboard.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user dismissed the selection (Escape, right click).
    #[error("Capture cancelled: {0}")]
    Cancelled(String),

    #[error("Capture timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Capture tool failed: {0}")]
    Tool(String),

    #[error("Clipboard operation failed: {0}")]
    ClipboardError(String),
}

impl CaptureError {
    /// Cancellation and timeouts end a run quietly instead of reporting a failure.
    pub fn is_clean_abort(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::TimedOut(_))
    }
}
