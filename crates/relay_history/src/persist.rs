use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::HistoryError;

/// Ensure the state directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), HistoryError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| HistoryError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(HistoryError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| HistoryError::OutputDir(e.to_string()))?;
    }
    // Writability check.
    NamedTempFile::new_in(dir).map_err(|e| HistoryError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes `{dir}/{filename}` through a temp file in the same directory, so a
/// crash mid-write never leaves a truncated file behind.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, HistoryError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| HistoryError::Io(e.error))?;
        Ok(target)
    }
}
