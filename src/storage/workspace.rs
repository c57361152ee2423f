//! Workspace management
//!
//! Handles workspace initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, WORKSPACE_DIR};
use super::{Snapshot, TaskStore};
use crate::domain::{Project, Task, TaskId};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not in a deadline workspace. Run 'deadline init' first or pass --snapshot.")]
    NotInWorkspace,

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}

const DEFAULT_CONFIG: &str = r#"# deadline configuration

# default_format = "text"

[estimator]
# Working hours available per day
hours_per_day = 8.0
# Weight of due-date urgency in the priority score
urgency_weight = 1.0
# Weight of the number of dependent tasks in the priority score
fan_out_weight = 0.25

[estimator.hint_multipliers]
low = 0.9
medium = 1.0
high = 1.25

[insights]
heavy_workload_hours = 10.0
week_horizon_days = 7
top_priorities = 5
"#;

/// A deadline workspace
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_workspace_root().ok_or(WorkspaceError::NotInWorkspace)?;

        Self::open(root)
    }

    /// Initializes a new workspace holding `project` and `tasks`
    pub fn init(root: impl Into<PathBuf>, project: &Project, tasks: &[Task]) -> Result<Self> {
        let root = root.into();
        let dir = root.join(WORKSPACE_DIR);
        let project_path = dir.join("project.toml");

        if project_path.exists() {
            return Err(WorkspaceError::AlreadyExists(root).into());
        }

        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {} directory: {}", WORKSPACE_DIR, dir.display()))?;

        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        TaskStore::for_workspace(&root).write_all(tasks)?;
        write_project(&project_path, project)?;

        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .deadline directory path
    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn task_store(&self) -> TaskStore {
        TaskStore::for_workspace(&self.root)
    }

    fn project_path(&self) -> PathBuf {
        self.workspace_dir().join("project.toml")
    }

    pub fn load_project(&self) -> Result<Project> {
        let path = self.project_path();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read project: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse project: {}", path.display()))
    }

    /// Returns the project and its tasks; every stored task is a member
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut project = self.load_project()?;
        let tasks: Vec<Task> = self.task_store().read_all()?.into_values().collect();

        for task in &tasks {
            project.add_task(task.id.clone());
        }

        Ok(Snapshot::new(project, tasks))
    }
}

fn write_project(path: &Path, project: &Project) -> Result<()> {
    let content = toml::to_string_pretty(project).context("Failed to serialize project")?;
    fs::write(path, content).with_context(|| format!("Failed to write project: {}", path.display()))
}
