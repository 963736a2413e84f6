//! Region screenshots via `slurp` + `grim`.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::types::CaptureError;

/// Upper bound for selecting a region and grabbing it.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(20);

/// Default screenshot collaborator: lets the user drag a region with `slurp`
/// and grabs it as PNG with `grim`.
#[derive(Debug, Clone, Copy)]
pub struct SlurpGrimSource {
    limit: Duration,
}

impl Default for SlurpGrimSource {
    fn default() -> Self {
        Self {
            limit: CAPTURE_TIMEOUT,
        }
    }
}

impl SlurpGrimSource {
    /// Runs the selection and capture, returning PNG bytes.
    pub async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        match timeout(self.limit, capture_selection()).await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::TimedOut(self.limit)),
        }
    }
}

async fn capture_selection() -> Result<Vec<u8>, CaptureError> {
    // `slurp` outputs geometry in the format "x,y widthxheight"
    let output = Command::new("slurp")
        .args(["-f", "%x,%y %wx%h"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CaptureError::Tool(format!("Failed to run slurp: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::Cancelled(format!(
            "selection dismissed{}",
            if stderr.trim().is_empty() {
                String::new()
            } else {
                format!(" ({})", stderr.trim())
            }
        )));
    }

    let geometry_output = String::from_utf8_lossy(&output.stdout);
    let geometry = geometry_output.trim();
    if geometry.is_empty() {
        return Err(CaptureError::Cancelled("slurp returned no region".into()));
    }

    log::debug!("Capturing region via grim: {}", geometry);
    let grim_output = Command::new("grim")
        .args(["-g", geometry, "-"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CaptureError::Tool(format!("Failed to run grim: {}", e)))?;

    if !grim_output.status.success() {
        let stderr = String::from_utf8_lossy(&grim_output.stderr);
        return Err(CaptureError::Tool(format!("grim failed: {}", stderr.trim())));
    }

    if grim_output.stdout.is_empty() {
        return Err(CaptureError::Tool("grim returned empty screenshot".into()));
    }

    log::info!("Captured region {} ({} bytes)", geometry, grim_output.stdout.len());
    Ok(grim_output.stdout)
}
