use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use relay_core::CursorSnapshot;
use relay_logging::relay_info;
use serde::{Deserialize, Serialize};

use crate::{AtomicFileWriter, HistoryError};

pub const CURSORS_FILENAME: &str = ".relay_cursors.ron";

/// Cursor table as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCursors {
    pub saved_at: DateTime<Utc>,
    pub snapshot: CursorSnapshot,
}

/// Keeps the cursor table in `{dir}/.relay_cursors.ron`.
#[derive(Debug, Clone)]
pub struct CursorStore {
    dir: PathBuf,
}

impl CursorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CURSORS_FILENAME)
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<SavedCursors>, HistoryError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let saved: SavedCursors = ron::from_str(&content)?;
        relay_info!(
            "loaded {} cursors saved at {} from {:?}",
            saved.snapshot.cursors.len(),
            saved.saved_at.to_rfc3339(),
            path
        );
        Ok(Some(saved))
    }

    pub fn save(&self, snapshot: &CursorSnapshot) -> Result<PathBuf, HistoryError> {
        self.save_at(snapshot, Utc::now())
    }

    pub fn save_at(
        &self,
        snapshot: &CursorSnapshot,
        saved_at: DateTime<Utc>,
    ) -> Result<PathBuf, HistoryError> {
        let saved = SavedCursors {
            saved_at,
            snapshot: snapshot.clone(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&saved, pretty)?;
        let path = AtomicFileWriter::new(self.dir.clone()).write(CURSORS_FILENAME, &content)?;
        relay_info!("saved {} cursors to {:?}", snapshot.cursors.len(), path);
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
