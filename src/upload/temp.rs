//! Scoped ownership of the one temporary file a pipeline run may create.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;

/// Holds at most one temporary path and removes it when dropped.
///
/// Tracking a new path removes the previously tracked one first. Removal
/// happens at most once per path.
#[derive(Debug)]
pub struct TempSlot {
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl TempSlot {
    /// Slot allocating inside the system temp directory.
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// Creates a fresh, empty, randomly named file readable only by us
    /// and tracks it.
    ///
    /// The file is created exclusively, so an existing path (or symlink)
    /// with the same name is never reused.
    pub fn allocate(&mut self, extension: Option<&str>) -> io::Result<PathBuf> {
        let (_file, path) = self.create(extension)?;
        Ok(path)
    }

    /// Allocates a file and writes `contents` to it.
    pub fn write(&mut self, extension: Option<&str>, contents: &[u8]) -> io::Result<PathBuf> {
        let (mut file, path) = self.create(extension)?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(path)
    }

    fn create(&mut self, extension: Option<&str>) -> io::Result<(File, PathBuf)> {
        let suffix = extension
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let named = Builder::new()
            .prefix("wayshare-")
            .suffix(&suffix)
            .rand_bytes(12)
            .tempfile_in(&self.dir)?;
        let (file, path) = named.keep().map_err(|e| e.error)?;
        self.track(path.clone());
        Ok((file, path))
    }

    pub fn track(&mut self, path: PathBuf) {
        if self.current.as_ref() == Some(&path) {
            return;
        }
        self.release();
        log::debug!("Tracking temporary file {}", path.display());
        self.current = Some(path);
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Removes the tracked file, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        let Some(path) = self.current.take() else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed temporary file {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temporary file {}: {}", path.display(), e),
        }
    }
}

impl Default for TempSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempSlot {
    fn drop(&mut self) {
        self.release();
    }
}
