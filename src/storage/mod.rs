//! # Storage Layer
//!
//! Persistence for deadline workspaces and snapshot files.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project | TOML | `.deadline/project.toml` |
//! | Tasks | JSONL (one JSON per line) | `.deadline/tasks.jsonl` |
//! | Config | TOML | `.deadline/config.toml` |
//! | Snapshots | JSON or YAML | anywhere, passed with `--snapshot` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] uses file locking (`fs2`) for concurrent access
//! - Task writes are atomic (temp file + rename)
//!
//! ## Workspace Structure
//!
//! ```text
//! .deadline/
//! ├── project.toml          # Project id, name and target date
//! ├── tasks.jsonl           # All tasks in JSONL format
//! └── config.toml           # Workspace configuration
//! ```
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point for accessing a deadline workspace
//! - [`TaskStore`] - Read/write tasks as JSONL
//! - [`Snapshot`] - Load/save `{ project, tasks }` documents
//! - [`Config`] - Layered global and workspace configuration

mod config;
mod jsonl;
mod snapshot;
mod workspace;

pub use config::{Config, ConfigError, ConfigFile, WORKSPACE_DIR};
pub use jsonl::TaskStore;
pub use snapshot::{Snapshot, SnapshotError, SnapshotFormat};
pub use workspace::{Workspace, WorkspaceError};
