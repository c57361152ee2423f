//! Snapshot files
//!
//! A snapshot is a self-contained `{ project, tasks }` document in JSON or
//! YAML, selected by file extension.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Project, Task};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Unsupported snapshot format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(SnapshotError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// A project and its tasks at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub project: Project,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Snapshot {
    pub fn new(project: Project, tasks: Vec<Task>) -> Self {
        Self { project, tasks }
    }

    /// Loads a snapshot file, picking the parser by extension
    pub fn load(path: &Path) -> Result<Self> {
        let format = SnapshotFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        Self::parse(&content, format)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }

    pub fn parse(content: &str, format: SnapshotFormat) -> Result<Self> {
        let snapshot = match format {
            SnapshotFormat::Json => serde_json::from_str(content)?,
            SnapshotFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(snapshot)
    }

    /// Writes the snapshot, picking the serializer by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match SnapshotFormat::from_path(path)? {
            SnapshotFormat::Json => serde_json::to_string_pretty(self)?,
            SnapshotFormat::Yaml => serde_yaml::to_string(self)?,
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))
    }
}
