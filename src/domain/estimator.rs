//! Deadline risk and priority estimation
//!
//! [`estimate`] schedules every task of a snapshot along its dependency
//! chain and derives, per task, a recommended due date, a risk label and a
//! priority rank.
//!
//! ## Timeline
//!
//! Time is measured in working days from `today` (offset 0). One working day
//! holds [`EstimatorConfig::hours_per_day`] effort hours. A task starts at the
//! latest of its dependencies' finishes and its own anchor (today for
//! not-started work, `started_on` for work already under way) and finishes
//! `effort_hours / hours_per_day` working days later. The recommended due
//! date is the first calendar day at or after that finish.
//!
//! ## Scoring
//!
//! ```text
//! urgency = 1 / (1 + max(days until recommended due date, 0))
//! score   = (urgency_weight * urgency + fan_out_weight * fan_out) * hint multiplier
//! ```
//!
//! Rank 1 is the highest score; equal scores are ranked by ascending task id.
//!
//! The computation is pure: inputs are borrowed immutably, the current date
//! is a parameter and nothing is cached between calls.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use super::graph::{format_cycle, DependencyGraph, GraphError};
use super::id::TaskId;
use super::project::Project;
use super::task::{PriorityHint, Task, TaskStatus};

/// Tolerance for float noise when rounding working-day offsets to dates
const OFFSET_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error("Dependency cycle detected: {}", format_cycle(cycle))]
    CyclicDependency { cycle: Vec<TaskId> },

    #[error("Task {task} depends on unknown task {missing}")]
    UnresolvedDependency { task: TaskId, missing: TaskId },

    #[error("Task {task} has invalid effort {effort} (expected a positive number of hours)")]
    InvalidEffort { task: TaskId, effort: f64 },

    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("Project references unknown task {0}")]
    UnknownProjectTask(TaskId),

    #[error("Invalid estimator configuration: {0}")]
    InvalidConfig(String),

    #[error("Schedule for task {0} falls outside the supported date range")]
    DateOutOfRange(TaskId),
}

impl From<GraphError> for EstimateError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CycleDetected(cycle) => EstimateError::CyclicDependency { cycle },
            GraphError::UnresolvedDependency { task, missing } => {
                EstimateError::UnresolvedDependency { task, missing }
            }
            GraphError::DuplicateTask(id) => EstimateError::DuplicateTask(id),
        }
    }
}

/// Score multipliers for declared priority hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintMultipliers {
    pub low: f64,
    /// Also applied to tasks without a hint
    pub medium: f64,
    pub high: f64,
}

impl Default for HintMultipliers {
    fn default() -> Self {
        Self {
            low: 0.9,
            medium: 1.0,
            high: 1.25,
        }
    }
}

impl HintMultipliers {
    pub fn for_hint(&self, hint: Option<PriorityHint>) -> f64 {
        match hint {
            Some(PriorityHint::Low) => self.low,
            Some(PriorityHint::Medium) | None => self.medium,
            Some(PriorityHint::High) => self.high,
        }
    }
}

/// Tunables for [`estimate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Effort hours that fit in one working day
    pub hours_per_day: f64,

    /// Weight of deadline urgency in the priority score
    pub urgency_weight: f64,

    /// Weight of direct dependent count in the priority score
    pub fan_out_weight: f64,

    pub hint_multipliers: HintMultipliers,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            hours_per_day: 8.0,
            urgency_weight: 1.0,
            fan_out_weight: 0.25,
            hint_multipliers: HintMultipliers::default(),
        }
    }
}

impl EstimatorConfig {
    /// Checks that every tunable is usable
    pub fn validate(&self) -> Result<(), EstimateError> {
        if !(self.hours_per_day.is_finite() && self.hours_per_day > 0.0) {
            return Err(EstimateError::InvalidConfig(format!(
                "hours_per_day must be positive, got {}",
                self.hours_per_day
            )));
        }

        let non_negative = [
            ("urgency_weight", self.urgency_weight),
            ("fan_out_weight", self.fan_out_weight),
            ("hint_multipliers.low", self.hint_multipliers.low),
            ("hint_multipliers.medium", self.hint_multipliers.medium),
            ("hint_multipliers.high", self.hint_multipliers.high),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EstimateError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Deadline achievability of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    OnTrack,
    AtRisk,
    OverdueLikely,
}

impl RiskLabel {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            RiskLabel::OnTrack => "on track",
            RiskLabel::AtRisk => "at risk",
            RiskLabel::OverdueLikely => "overdue-likely",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The inputs and intermediate values behind one estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub status: TaskStatus,

    pub effort_hours: f64,

    /// Effort converted to working days (zero for done tasks)
    pub effort_days: f64,

    /// Calendar day the task can start on
    pub earliest_start: NaiveDate,

    /// Working-day offsets from the estimation date
    pub start_offset_days: f64,
    pub finish_offset_days: f64,

    /// Dependency whose finish determined the start, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driven_by: Option<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_due_date: Option<NaiveDate>,

    /// Calendar days from the estimation date to the recommended due date
    pub days_until_due: i64,

    pub urgency: f64,

    /// Number of tasks directly depending on this one
    pub fan_out: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<PriorityHint>,

    pub hint_multiplier: f64,

    pub score: f64,
}

/// Estimation output for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub task_id: TaskId,
    pub recommended_due_date: NaiveDate,
    /// 1 is the most urgent
    pub priority_rank: usize,
    pub risk: RiskLabel,
    pub explanation: Explanation,
}

/// Validates a snapshot and returns its dependency graph
///
/// Checks run in a fixed order (configuration, duplicate ids, effort,
/// project membership, dependency resolution, cycles) and each check visits
/// tasks by ascending id, so the same bad input always reports the same
/// error.
pub fn validate(
    project: &Project,
    tasks: &[Task],
    config: &EstimatorConfig,
) -> Result<DependencyGraph, EstimateError> {
    config.validate()?;

    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut seen = HashSet::with_capacity(sorted.len());
    for task in sorted.iter().copied() {
        if !seen.insert(&task.id) {
            return Err(EstimateError::DuplicateTask(task.id.clone()));
        }
    }

    if let Some(task) = sorted.iter().find(|t| !t.has_valid_effort()) {
        return Err(EstimateError::InvalidEffort {
            task: task.id.clone(),
            effort: task.effort_hours,
        });
    }

    if let Some(missing) = project.tasks.iter().find(|id| !seen.contains(id)) {
        return Err(EstimateError::UnknownProjectTask(missing.clone()));
    }

    Ok(DependencyGraph::from_tasks(sorted)?)
}

/// Estimates recommended due dates, risk labels and priority ranks
///
/// Returns exactly one result per task, ordered by priority rank. Fails
/// without partial output if the snapshot is invalid (see [`validate`]).
pub fn estimate(
    project: &Project,
    tasks: &[Task],
    today: NaiveDate,
    config: &EstimatorConfig,
) -> Result<Vec<EstimationResult>, EstimateError> {
    let graph = validate(project, tasks, config)?;
    let by_id: HashMap<&TaskId, &Task> = tasks.iter().map(|t| (&t.id, t)).collect();

    let mut finishes: HashMap<TaskId, f64> = HashMap::with_capacity(tasks.len());
    let mut results = Vec::with_capacity(tasks.len());

    for task_id in graph.topological_order()? {
        let task = by_id[&task_id];

        // Latest-finishing dependency; ties go to the smaller id
        let mut dep_finish: Option<(f64, TaskId)> = None;
        for dep_id in graph.dependencies(&task_id) {
            let finish = finishes.get(&dep_id).copied().unwrap_or(0.0);
            if dep_finish.as_ref().map_or(true, |(best, _)| finish > *best) {
                dep_finish = Some((finish, dep_id));
            }
        }

        let anchor = match task.status {
            TaskStatus::NotStarted => 0.0,
            TaskStatus::InProgress | TaskStatus::Blocked => {
                task.started_on.map_or(0.0, |d| days_between(today, d) as f64)
            }
            TaskStatus::Done => task.completed_on.map_or(0.0, |d| days_between(today, d) as f64),
        };

        let (start, driven_by) = match dep_finish {
            Some((finish, dep_id)) if finish > anchor => (finish, Some(dep_id)),
            _ => (anchor, None),
        };

        let effort_days = if task.status.is_complete() {
            0.0
        } else {
            task.effort_hours / config.hours_per_day
        };
        let finish = start + effort_days;
        finishes.insert(task_id.clone(), finish);

        let recommended_due_date = shift(today, ceil_days(finish))
            .ok_or_else(|| EstimateError::DateOutOfRange(task_id.clone()))?;
        let earliest_start = shift(today, floor_days(start))
            .ok_or_else(|| EstimateError::DateOutOfRange(task_id.clone()))?;

        let days_until_due = days_between(today, recommended_due_date);
        let fan_out = graph.fan_out(&task_id);
        let hint_multiplier = config.hint_multipliers.for_hint(task.priority);

        let (urgency, score) = if task.status.is_complete() {
            (0.0, 0.0)
        } else {
            let urgency = 1.0 / (1.0 + days_until_due.max(0) as f64);
            let score = (config.urgency_weight * urgency
                + config.fan_out_weight * fan_out as f64)
                * hint_multiplier;
            (urgency, score)
        };

        let risk = classify(task, recommended_due_date, today);

        results.push(EstimationResult {
            task_id,
            recommended_due_date,
            priority_rank: 0,
            risk,
            explanation: Explanation {
                status: task.status,
                effort_hours: task.effort_hours,
                effort_days,
                earliest_start,
                start_offset_days: start,
                finish_offset_days: finish,
                driven_by,
                declared_due_date: task.due_date,
                days_until_due,
                urgency,
                fan_out,
                hint: task.priority,
                hint_multiplier,
                score,
            },
        });
    }

    results.sort_by(|a, b| {
        b.explanation
            .score
            .total_cmp(&a.explanation.score)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });
    for (idx, result) in results.iter_mut().enumerate() {
        result.priority_rank = idx + 1;
    }

    Ok(results)
}

fn classify(task: &Task, recommended: NaiveDate, today: NaiveDate) -> RiskLabel {
    if task.status.is_complete() {
        return RiskLabel::OnTrack;
    }

    let declared_passed = task.due_date.is_some_and(|due| due < today);
    if recommended < today || declared_passed {
        return RiskLabel::OverdueLikely;
    }

    if task.due_date.is_some_and(|due| due < recommended) {
        return RiskLabel::AtRisk;
    }

    RiskLabel::OnTrack
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

fn ceil_days(offset: f64) -> i64 {
    (offset - OFFSET_EPSILON).ceil() as i64
}

fn floor_days(offset: f64) -> i64 {
    (offset + OFFSET_EPSILON).floor() as i64
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(TimeDelta::try_days(days)?)
}
