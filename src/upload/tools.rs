//! Thin wrappers around optional desktop tools: exiftool, zenity and paplay.

use std::path::Path;
use std::process::{Command, Stdio};

use super::dependencies::{ConfirmDialog, MetadataStripper, SoundPlayer};

/// Which optional tools are installed, probed once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub exiftool: bool,
    pub zenity: bool,
}

impl Capabilities {
    pub fn probe() -> Self {
        let capabilities = Self {
            exiftool: tool_responds("exiftool", "-ver"),
            zenity: tool_responds("zenity", "--version"),
        };
        log::debug!("Probed optional tools: {:?}", capabilities);
        capabilities
    }
}

/// Checks that `program` exists by running it with a harmless flag.
fn tool_responds(program: &str, flag: &str) -> bool {
    Command::new(program)
        .arg(flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// `exiftool -all= -overwrite_original <path>`.
#[derive(Debug, Clone, Copy)]
pub struct ExifTool;

impl MetadataStripper for ExifTool {
    fn strip(&self, path: &Path) -> Result<(), String> {
        log::debug!("Stripping metadata from {}", path.display());
        let output = Command::new("exiftool")
            .args(["-q", "-all=", "-overwrite_original"])
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| format!("failed to run exiftool: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("exiftool failed: {}", stderr.trim()));
        }
        Ok(())
    }
}

/// `zenity --question`; exit status 0 means yes.
#[derive(Debug, Clone, Copy)]
pub struct ZenityDialog;

impl ConfirmDialog for ZenityDialog {
    fn confirm(&self, question: &str) -> bool {
        log::debug!("Asking for confirmation: {}", question);
        match Command::new("zenity")
            .args(["--question", "--title", "wayshare", "--text"])
            .arg(question)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                log::warn!("Failed to run zenity ({}); proceeding without confirmation", e);
                true
            }
        }
    }
}

/// Plays sounds with `paplay`, detached from the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PaplayPlayer;

/// `paplay` volume scale: 65536 is 100%.
const PA_VOLUME_NORM: f64 = 65536.0;

impl SoundPlayer for PaplayPlayer {
    fn play(&self, sound: &Path, volume: f64) {
        if !sound.exists() {
            log::debug!("Sound file {} missing, staying quiet", sound.display());
            return;
        }

        let level = (volume.clamp(0.0, 1.0) * PA_VOLUME_NORM).round() as u32;
        let spawned = Command::new("paplay")
            .arg(format!("--volume={level}"))
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        // The child is intentionally not waited for.
        if let Err(e) = spawned {
            log::warn!("Failed to play {}: {}", sound.display(), e);
        }
    }
}
