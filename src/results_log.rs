use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// A single measurement as written to the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub date: String,
    pub elapsed_ms: u64,
}

/// Append-only CSV journal of every measured result (`date,elapsed_ms`)
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, elapsed_ms: u64) -> csv::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Header only for a fresh file
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(ResultEntry {
            date: Local::now().format("%c").to_string(),
            elapsed_ms,
        })?;
        writer.flush()?;
        Ok(())
    }

    /// Every journaled entry, oldest first. A missing journal is empty.
    pub fn entries(&self) -> csv::Result<Vec<ResultEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        reader.deserialize().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_with_a_single_header() {
        let dir = tempdir().unwrap();
        let log = ResultsLog::new(dir.path().join("state").join("results.csv"));

        log.append(250).unwrap();
        log.append(180).unwrap();

        let raw = fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.matches("date,elapsed_ms").count(), 1);

        let elapsed: Vec<u64> = log.entries().unwrap().iter().map(|e| e.elapsed_ms).collect();
        assert_eq!(elapsed, vec![250, 180]);
    }

    #[test]
    fn missing_journal_is_empty() {
        let dir = tempdir().unwrap();
        let log = ResultsLog::new(dir.path().join("results.csv"));
        assert!(log.entries().unwrap().is_empty());
    }
}
