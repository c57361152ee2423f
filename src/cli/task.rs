//! Task status commands

use anyhow::Result;
use chrono::NaiveDate;

use super::output::Output;
use crate::domain::{TaskId, TaskStatus};
use crate::storage::{Workspace, WorkspaceError};

/// Moves a workspace task to a new status, stamping start/completion dates
pub fn transition(output: &Output, id_str: &str, status_str: &str, on: NaiveDate) -> Result<()> {
    let workspace = Workspace::open_current()?;
    let store = workspace.task_store();

    let id: TaskId = id_str.parse()?;
    let to: TaskStatus = status_str.parse()?;

    // Read, transition and rewrite under one lock so concurrent edits are kept
    let (from, task) = store
        .modify(&id, |task| {
            let from = task.status;
            output.verbose_ctx("transition", &format!("{}: {} -> {} on {}", id, from, to, on));
            task.transition_to(to, on)?;
            Ok((from, task.clone()))
        })?
        .ok_or_else(|| WorkspaceError::TaskNotFound(id.clone()))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "from": from,
            "status": task.status,
            "started_on": task.started_on,
            "completed_on": task.completed_on,
        }));
    } else {
        output.success(&format!("Task {}: {} -> {}", task.id, from, task.status));
    }

    Ok(())
}
