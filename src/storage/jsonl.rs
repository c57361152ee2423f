//! JSONL storage for tasks
//!
//! Tasks are stored in `.deadline/tasks.jsonl` with one JSON object per line.
//! A later line for the same id replaces an earlier one.
//! Readers and writers coordinate through an `fs2` lock on `tasks.lock`.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::config::WORKSPACE_DIR;
use crate::domain::{Task, TaskId};

/// Store for task data in JSONL format
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a workspace
    pub fn for_workspace(workspace_root: &Path) -> Self {
        Self::new(workspace_root.join(WORKSPACE_DIR).join("tasks.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the lock file guarding the store
    ///
    /// Writers replace `tasks.jsonl` by renaming a temp file over it, so the
    /// lock lives on a separate file that is never renamed or truncated.
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn open_lock(&self) -> Result<File> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))
    }

    /// Blocks until no writer holds the store; released when the file is dropped
    pub fn lock_shared(&self) -> Result<File> {
        let lock = self.open_lock()?;
        lock.lock_shared()
            .context("Failed to acquire read lock on task store")?;
        Ok(lock)
    }

    /// Blocks until the store is free; released when the file is dropped
    pub fn lock_exclusive(&self) -> Result<File> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .context("Failed to acquire write lock on task store")?;
        Ok(lock)
    }

    /// Reads all tasks, keyed and ordered by id
    pub fn read_all(&self) -> Result<BTreeMap<TaskId, Task>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let _lock = self.lock_shared()?;
        self.read_unlocked()
    }

    /// Writes all tasks to the store (full rewrite, atomic)
    pub fn write_all<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Result<()> {
        let _lock = self.lock_exclusive()?;
        self.write_unlocked(tasks)
    }

    /// Applies `f` to one task and persists the result
    ///
    /// The write lock is held from the read until the rewrite lands, so
    /// concurrent changes to other tasks are never lost. Returns `Ok(None)`
    /// when the task does not exist. Nothing is written if `f` fails.
    pub fn modify<T>(
        &self,
        id: &TaskId,
        f: impl FnOnce(&mut Task) -> Result<T>,
    ) -> Result<Option<T>> {
        let _lock = self.lock_exclusive()?;
        let mut tasks = self.read_unlocked()?;

        let value = match tasks.get_mut(id) {
            Some(task) => f(task)?,
            None => return Ok(None),
        };

        self.write_unlocked(tasks.values())?;
        Ok(Some(value))
    }

    fn read_unlocked(&self) -> Result<BTreeMap<TaskId, Task>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        let reader = BufReader::new(file);
        let mut tasks = BTreeMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let task: Task = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;

            tasks.insert(task.id.clone(), task);
        }

        Ok(tasks)
    }

    // Callers hold the exclusive lock, so the temp file is never shared
    fn write_unlocked<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);

            let mut sorted: Vec<&Task> = tasks.into_iter().collect();
            sorted.sort_by(|a, b| a.id.cmp(&b.id));

            for task in sorted {
                let line = serde_json::to_string(task).context("Failed to serialize task")?;
                writeln!(writer, "{}", line).context("Failed to write task")?;
            }

            writer.flush().context("Failed to flush task store")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
