//! Append-only log of published URLs.

use anyhow::{Context, Result};
use chrono::Local;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One line per successful upload: `timestamp<TAB>size<TAB>url`.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry, creating the file and its directory on first use.
    pub fn append(&self, public_url: &str, formatted_size: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create history directory {}", parent.display())
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open history file {}", self.path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock history file {}", self.path.display()))?;

        let line = format!(
            "{}\t{}\t{}\n",
            Local::now().to_rfc3339(),
            formatted_size,
            public_url
        );
        let result = file
            .write_all(line.as_bytes())
            .with_context(|| format!("failed to write history file {}", self.path.display()));

        file.unlock().unwrap_or_else(|err| {
            log::warn!(
                "failed to unlock history file {}: {}",
                self.path.display(),
                err
            )
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_one_line_per_upload() {
        let temp = TempDir::new().unwrap();
        let log = HistoryLog::new(temp.path().join("nested").join("history.log"));

        log.append("https://i.example.com/abc.png", "2.00 KB").unwrap();
        log.append("https://i.example.com/def.txt", "12 bytes").unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields.len(), 3);
        assert!(chrono::DateTime::parse_from_rfc3339(fields[0]).is_ok());
        assert_eq!(fields[1], "2.00 KB");
        assert_eq!(fields[2], "https://i.example.com/abc.png");
        assert!(lines[1].ends_with("https://i.example.com/def.txt"));
    }
}
