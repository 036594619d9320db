//! Status directory loader.
//!
//! Reads every `*.json` status file in the status directory, creating the
//! directory and a placeholder `system` record when there is nothing to read.
//! Unreadable or malformed files are skipped with a warning.

use crate::models::AgentStatusRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extension of status record files.
pub const STATUS_EXTENSION: &str = "json";

/// File name of the placeholder record.
pub const SYSTEM_FILE: &str = "system.json";

/// Per-file failures. These never abort a run.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Failed to read status file
    #[error("Failed to read status file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse status file JSON
    #[error("Failed to parse status file {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loader for a single status directory.
pub struct StatusLoader {
    status_dir: PathBuf,
}

impl StatusLoader {
    /// Create a new loader.
    pub fn new(status_dir: PathBuf) -> Self {
        Self { status_dir }
    }

    /// Load all status records.
    ///
    /// The directory exists when this returns `Ok`. Only directory creation
    /// and placeholder writes are fatal; per-file problems are logged.
    pub fn load(&self, now: DateTime<Utc>) -> Result<Vec<AgentStatusRecord>> {
        if !self.status_dir.exists() {
            info!("Creating {} directory...", self.status_dir.display());
            fs::create_dir_all(&self.status_dir).with_context(|| {
                format!(
                    "Failed to create status directory {}",
                    self.status_dir.display()
                )
            })?;

            let path = self.write_placeholder(now)?;
            info!("Created {}", path.display());
        }

        let files = self.status_files();

        if files.is_empty() {
            info!("No agent status files found, creating empty status board");
            let path = self.write_placeholder(now)?;
            debug!("Wrote placeholder record to {}", path.display());
            return Ok(vec![AgentStatusRecord::system_placeholder(now)]);
        }

        let mut records = Vec::with_capacity(files.len());
        for path in &files {
            match read_record(path) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!("Skipping empty status file {}", path.display()),
                Err(e) => warn!("Skipping status file: {}", e),
            }
        }

        info!(
            "Loaded {} of {} status files from {}",
            records.len(),
            files.len(),
            self.status_dir.display()
        );

        Ok(records)
    }

    /// List status files, in file-name order.
    pub fn status_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.status_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Cannot read entry in {}: {}", self.status_dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if path.is_file() && has_status_extension(path) {
                files.push(path.to_path_buf());
            }
        }

        files
    }

    /// Persist the placeholder record and return its path.
    fn write_placeholder(&self, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.status_dir.join(SYSTEM_FILE);
        let record = AgentStatusRecord::system_placeholder(now);
        let content = serde_json::to_string_pretty(&record)
            .context("Failed to serialize placeholder record")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

/// Read and parse one status file.
///
/// Returns `Ok(None)` for a file holding an empty object.
pub fn read_record(path: &Path) -> Result<Option<AgentStatusRecord>, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    // Repeated keys are legal JSON; the map keeps the last value.
    let map: Map<String, Value> =
        serde_json::from_str(&content).map_err(|source| LoadError::ParseJson {
            path: path.to_path_buf(),
            source,
        })?;

    if map.is_empty() {
        return Ok(None);
    }

    let record = serde_json::from_value(Value::Object(map)).map_err(|source| {
        LoadError::ParseJson {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(Some(record))
}

fn has_status_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(STATUS_EXTENSION)
}
