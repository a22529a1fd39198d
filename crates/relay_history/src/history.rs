use std::fs;
use std::path::{Path, PathBuf};

use relay_core::Event;
use relay_logging::{relay_debug, relay_info};

use crate::{AtomicFileWriter, HistoryError};

/// Reads stored history: one JSON event per line, blank lines skipped.
pub fn load_history_file(path: &Path) -> Result<Vec<Event>, HistoryError> {
    let content = fs::read_to_string(path)?;
    let events = parse_history(&content)?;
    relay_info!("read {} events from {:?}", events.len(), path);
    Ok(events)
}

/// Parses JSON-lines history. Line numbers in errors are 1-based.
pub fn parse_history(content: &str) -> Result<Vec<Event>, HistoryError> {
    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(line).map_err(|source| HistoryError::Parse {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }
    relay_debug!("parsed {} history lines", events.len());
    Ok(events)
}

/// Stores `events` as `{dir}/{filename}` in the format `load_history_file` reads.
pub fn write_history_file(
    dir: &Path,
    filename: &str,
    events: &[Event],
) -> Result<PathBuf, HistoryError> {
    let mut content = String::new();
    for event in events {
        let line = serde_json::to_string(event).map_err(|source| HistoryError::Encode {
            sequence: event.sequence,
            source,
        })?;
        content.push_str(&line);
        content.push('\n');
    }
    AtomicFileWriter::new(dir.to_path_buf()).write(filename, &content)
}
