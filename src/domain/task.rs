//! Task domain model
//!
//! Tasks are the units of work the estimator schedules. A task carries its
//! effort, an optional declared due date, a status and the set of tasks it
//! depends on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::TaskId;

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("Invalid status transition{}: {from} -> {to}", for_task(.task))]
    InvalidTransition {
        task: Option<TaskId>,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Unknown status '{0}' (expected not_started, in_progress, blocked or done)")]
    UnknownStatus(String),
}

fn for_task(task: &Option<TaskId>) -> String {
    match task {
        Some(id) => format!(" for {}", id),
        None => String::new(),
    }
}

/// Status of a task
///
/// Allowed transitions:
///
/// ```text
/// not_started -> in_progress -> done
///                 |     ^
///                 v     |
///                 blocked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    /// Returns true if this status represents completion
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Returns true if this task is not yet started
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::NotStarted)
    }

    /// Returns true if the state machine allows moving from `self` to `to`
    pub fn can_transition(&self, to: TaskStatus) -> bool {
        matches!(
            (self, to),
            (TaskStatus::NotStarted, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Blocked)
                | (TaskStatus::Blocked, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Done)
        )
    }

    /// Validates a transition, returning the new status
    pub fn transition(self, to: TaskStatus) -> Result<TaskStatus, TransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransitionError::InvalidTransition {
                task: None,
                from: self,
                to,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "done" => Ok(TaskStatus::Done),
            _ => Err(TransitionError::UnknownStatus(s.to_string())),
        }
    }
}

/// Declared priority hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityHint {
    Low,
    Medium,
    High,
}

impl PriorityHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityHint::Low => "low",
            PriorityHint::Medium => "medium",
            PriorityHint::High => "high",
        }
    }
}

impl fmt::Display for PriorityHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    /// Estimated effort in hours
    #[serde(alias = "estimated_hours")]
    pub effort_hours: f64,

    /// Declared due date
    #[serde(default, alias = "deadline", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    /// Declared priority hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityHint>,

    /// Tasks that must be done before this one can start
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<TaskId>,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When work began
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_on: Option<NaiveDate>,

    /// When the task was completed (if done)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
}

impl Task {
    /// Creates a not-started task with the given ID, title and effort
    pub fn new(id: TaskId, title: impl Into<String>, effort_hours: f64) -> Self {
        Self {
            id,
            title: title.into(),
            effort_hours,
            due_date: None,
            status: TaskStatus::NotStarted,
            priority: None,
            depends_on: BTreeSet::new(),
            description: None,
            started_on: None,
            completed_on: None,
        }
    }

    /// Returns true if the effort is a positive, finite number of hours
    pub fn has_valid_effort(&self) -> bool {
        self.effort_hours.is_finite() && self.effort_hours > 0.0
    }

    /// Returns true if this task has no incomplete dependencies
    pub fn is_ready(&self, task_statuses: &HashMap<TaskId, TaskStatus>) -> bool {
        if self.status.is_complete() {
            return false;
        }

        self.depends_on.iter().all(|dep_id| {
            task_statuses
                .get(dep_id)
                .map(|s| s.is_complete())
                .unwrap_or(false)
        })
    }

    /// Applies a status transition dated `on`
    ///
    /// `started_on` is stamped the first time the task enters `in_progress`,
    /// `completed_on` when it reaches `done`.
    pub fn transition_to(&mut self, to: TaskStatus, on: NaiveDate) -> Result<(), TransitionError> {
        let next = self.status.transition(to).map_err(|e| match e {
            TransitionError::InvalidTransition { from, to, .. } => {
                TransitionError::InvalidTransition {
                    task: Some(self.id.clone()),
                    from,
                    to,
                }
            }
            other => other,
        })?;

        if next == TaskStatus::InProgress && self.started_on.is_none() {
            self.started_on = Some(on);
        }
        if next == TaskStatus::Done {
            self.completed_on = Some(on);
        }
        self.status = next;
        Ok(())
    }

    /// Adds a dependency on another task
    pub fn add_dependency(&mut self, task_id: TaskId) -> bool {
        self.depends_on.insert(task_id)
    }

    pub fn set_due_date(&mut self, due: NaiveDate) {
        self.due_date = Some(due);
    }

    pub fn set_priority(&mut self, hint: PriorityHint) {
        self.priority = Some(hint);
    }
}
