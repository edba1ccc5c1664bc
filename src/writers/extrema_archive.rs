use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ProcessingError, Result};
use crate::models::ExtremaRecord;

/// Destination for finalized daily extremes.
pub trait ExtremaArchive: Send {
    fn archive(&mut self, record: &ExtremaRecord) -> Result<()>;
}

/// Appends one JSON document per finalized day.
#[derive(Debug, Clone)]
pub struct JsonLinesArchive {
    path: PathBuf,
}

impl JsonLinesArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All archived days, oldest first. A missing file is an empty archive.
    pub fn read_all(&self) -> Result<Vec<ExtremaRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);

        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                ProcessingError::Archive(format!(
                    "{} line {}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl ExtremaArchive for JsonLinesArchive {
    fn archive(&mut self, record: &ExtremaRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        info!(
            date = %record.date,
            path = %self.path.display(),
            "archived daily extremes"
        );
        Ok(())
    }
}

/// Keeps archived records in memory; used by tests and replays without an
/// archive path.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    records: Vec<ExtremaRecord>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ExtremaRecord] {
        &self.records
    }
}

impl ExtremaArchive for MemoryArchive {
    fn archive(&mut self, record: &ExtremaRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Either archive, chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredArchive {
    JsonLines(JsonLinesArchive),
    Memory(MemoryArchive),
}

impl ConfiguredArchive {
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => ConfiguredArchive::JsonLines(JsonLinesArchive::new(path)),
            None => ConfiguredArchive::Memory(MemoryArchive::new()),
        }
    }
}

impl ExtremaArchive for ConfiguredArchive {
    fn archive(&mut self, record: &ExtremaRecord) -> Result<()> {
        match self {
            ConfiguredArchive::JsonLines(archive) => archive.archive(record),
            ConfiguredArchive::Memory(archive) => archive.archive(record),
        }
    }
}
