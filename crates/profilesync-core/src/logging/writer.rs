//! Append-only JSONL file per participant.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::entry::JsonLogEntry;

/// Appends log entries to `<logs_dir>/raw/<YYYY-MM-DD>_<participant>.jsonl`
///
/// One file per participant per day, so processes running side by side on
/// one machine never write to the same file.
pub struct ParticipantLogWriter {
    participant: String,
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl ParticipantLogWriter {
    /// Open (or create) today's log file for `participant`
    pub fn new(logs_dir: impl AsRef<Path>, participant: impl Into<String>) -> std::io::Result<Self> {
        let participant = participant.into();

        let raw_dir = logs_dir.as_ref().join("raw");
        fs::create_dir_all(&raw_dir)?;

        let date = chrono::Local::now().format("%Y-%m-%d");
        let path = raw_dir.join(format!("{}_{}.jsonl", date, participant));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            participant,
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush
    pub fn write(&self, entry: &JsonLogEntry) -> std::io::Result<()> {
        let json = entry
            .to_json_line()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", json)?;
        writer.flush()
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }
}

impl Drop for ParticipantLogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Read every entry from a JSONL file, skipping lines that fail to parse
pub fn read_entries(path: impl AsRef<Path>) -> std::io::Result<Vec<JsonLogEntry>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| JsonLogEntry::from_json_line(line).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writer_appends_lines() {
        let temp = TempDir::new().unwrap();
        let writer = ParticipantLogWriter::new(temp.path(), "64").unwrap();

        writer
            .write(&JsonLogEntry::new("info", "64", "test", "first"))
            .unwrap();
        writer
            .write(&JsonLogEntry::new("warn", "64", "test", "second"))
            .unwrap();

        assert!(writer.path().starts_with(temp.path().join("raw")));
        assert!(writer.path().to_string_lossy().ends_with("_64.jsonl"));

        let entries = read_entries(writer.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].msg, "second");
    }

    #[test]
    fn test_read_skips_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mixed.jsonl");
        let good = JsonLogEntry::new("info", "1", "t", "ok").to_json_line().unwrap();
        fs::write(&path, format!("{}\nnot json\n\n", good)).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
