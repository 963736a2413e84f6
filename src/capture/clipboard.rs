//! Wayland clipboard access.
//!
//! Writes go through the `wl-copy` command first (it forks and keeps serving
//! the selection after we exit) and fall back to wl-clipboard-rs. Reads use
//! wl-clipboard-rs directly.

use super::types::CaptureError;
use std::io::Read;
use std::process::{Command, Stdio};
use wl_clipboard_rs::{copy, paste};

/// MIME type used for plain-text clipboard writes.
pub const TEXT_MIME: &str = "text/plain;charset=utf-8";

/// Default clipboard collaborator backed by the Wayland data-control protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaylandClipboard;

impl WaylandClipboard {
    /// MIME types currently offered on the regular clipboard, sorted.
    ///
    /// An empty clipboard yields an empty list rather than an error.
    pub fn mime_types(&self) -> Result<Vec<String>, CaptureError> {
        match paste::get_mime_types(paste::ClipboardType::Regular, paste::Seat::Unspecified) {
            Ok(types) => {
                let mut types: Vec<String> = types.into_iter().collect();
                types.sort();
                log::debug!("Clipboard offers {} MIME types: {:?}", types.len(), types);
                Ok(types)
            }
            Err(paste::Error::ClipboardEmpty) | Err(paste::Error::NoMimeType) => Ok(Vec::new()),
            Err(e) => Err(CaptureError::ClipboardError(format!(
                "failed to list clipboard types: {}",
                e
            ))),
        }
    }

    /// Reads the clipboard contents offered under `mime_type`.
    pub fn read(&self, mime_type: &str) -> Result<Vec<u8>, CaptureError> {
        self.read_as(paste::MimeType::Specific(mime_type))
    }

    /// Reads the clipboard as text, picking whichever text type is offered.
    pub fn read_text(&self) -> Result<String, CaptureError> {
        let bytes = self.read_as(paste::MimeType::Text)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_as(&self, mime_type: paste::MimeType<'_>) -> Result<Vec<u8>, CaptureError> {
        let result = paste::get_contents(
            paste::ClipboardType::Regular,
            paste::Seat::Unspecified,
            mime_type,
        );

        let (mut pipe, offered) = match result {
            Ok(contents) => contents,
            Err(paste::Error::ClipboardEmpty) | Err(paste::Error::NoMimeType) => {
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(CaptureError::ClipboardError(format!(
                    "failed to read clipboard: {}",
                    e
                )));
            }
        };

        let mut data = Vec::new();
        pipe.read_to_end(&mut data).map_err(|e| {
            CaptureError::ClipboardError(format!("failed to read clipboard pipe: {}", e))
        })?;
        log::debug!("Read {} bytes of {} from clipboard", data.len(), offered);
        Ok(data)
    }

    /// Places `text` on the clipboard.
    pub fn copy_text(&self, text: &str) -> Result<(), CaptureError> {
        self.copy_bytes(text.as_bytes(), TEXT_MIME)
    }

    /// Places raw bytes on the clipboard under `mime_type`.
    pub fn copy_bytes(&self, data: &[u8], mime_type: &str) -> Result<(), CaptureError> {
        log::debug!(
            "Attempting to copy {} bytes of {} to clipboard",
            data.len(),
            mime_type
        );

        match copy_via_command(data, mime_type) {
            Ok(()) => {
                log::info!("Copied {} to clipboard via wl-copy", mime_type);
                Ok(())
            }
            Err(cmd_err) => {
                log::warn!(
                    "wl-copy command path failed ({}). Falling back to wl-clipboard-rs",
                    cmd_err
                );
                copy_via_library(data, mime_type).map_err(|lib_err| {
                    CaptureError::ClipboardError(format!(
                        "wl-copy failed: {} ; wl-clipboard-rs failed: {}",
                        cmd_err, lib_err
                    ))
                })?;
                log::info!("Copied {} to clipboard via wl-clipboard-rs fallback", mime_type);
                Ok(())
            }
        }
    }
}

fn copy_via_library(data: &[u8], mime_type: &str) -> Result<(), CaptureError> {
    let mut opts = copy::Options::new();
    // Keep serving pastes until another client takes the selection.
    opts.serve_requests(copy::ServeRequests::Unlimited);

    let mime = if mime_type == TEXT_MIME {
        copy::MimeType::Text
    } else {
        copy::MimeType::Specific(mime_type.to_string())
    };

    opts.copy(copy::Source::Bytes(data.into()), mime)
        .map_err(|e| CaptureError::ClipboardError(format!("wl-clipboard-rs error: {}", e)))
}

fn copy_via_command(data: &[u8], mime_type: &str) -> Result<(), CaptureError> {
    use std::io::Write;

    let mut child = Command::new("wl-copy")
        .arg("--type")
        .arg(mime_type)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            CaptureError::ClipboardError(format!(
                "Failed to spawn wl-copy (is it installed?): {}",
                e
            ))
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(data).map_err(|e| {
            CaptureError::ClipboardError(format!("Failed to write to wl-copy stdin: {}", e))
        })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| CaptureError::ClipboardError(format!("Failed to wait for wl-copy: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::ClipboardError(format!(
            "wl-copy failed: {}",
            stderr.trim()
        )));
    }

    Ok(())
}
