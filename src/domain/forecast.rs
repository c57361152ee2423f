//! Project completion forecast
//!
//! Rolls per-task estimations up to the project: when the last member task
//! is expected to finish, how that compares with the target date, and which
//! chain of dependencies decides it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::estimator::{EstimationResult, RiskLabel};
use super::id::{ProjectId, TaskId};
use super::project::Project;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectForecast {
    pub project_id: ProjectId,

    /// Latest recommended due date among member tasks
    pub estimated_completion: NaiveDate,

    pub target_date: NaiveDate,

    /// Days between estimated completion and target; negative means late
    pub slack_days: i64,

    pub risk: RiskLabel,

    /// Driving dependency chain ending at the last task to finish, first task first
    pub critical_path: Vec<TaskId>,

    pub remaining_tasks: usize,

    pub remaining_hours: f64,

    pub at_risk: Vec<TaskId>,

    pub overdue: Vec<TaskId>,
}

/// Builds the forecast for `project` from the output of [`super::estimate`]
pub fn forecast(project: &Project, results: &[EstimationResult], today: NaiveDate) -> ProjectForecast {
    let by_id: HashMap<&TaskId, &EstimationResult> =
        results.iter().map(|r| (&r.task_id, r)).collect();

    let mut members: Vec<&EstimationResult> = project
        .tasks
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .collect();
    members.sort_by(|a, b| a.task_id.cmp(&b.task_id));

    // Latest finish wins; among equal finishes the smallest id
    let mut last: Option<&EstimationResult> = None;
    for result in members.iter().copied() {
        let later = last.map_or(true, |best| {
            result.explanation.finish_offset_days > best.explanation.finish_offset_days
        });
        if later {
            last = Some(result);
        }
    }

    let estimated_completion = members
        .iter()
        .map(|r| r.recommended_due_date)
        .max()
        .unwrap_or(today);

    let mut critical_path = Vec::new();
    let mut cursor = last;
    while let Some(result) = cursor {
        critical_path.push(result.task_id.clone());
        cursor = result
            .explanation
            .driven_by
            .as_ref()
            .and_then(|dep| by_id.get(dep).copied());
    }
    critical_path.reverse();

    let open: Vec<&EstimationResult> = members
        .iter()
        .copied()
        .filter(|r| !r.explanation.status.is_complete())
        .collect();
    let remaining_hours: f64 = open.iter().map(|r| r.explanation.effort_hours).sum();

    let ids_with = |risk: RiskLabel| -> Vec<TaskId> {
        members
            .iter()
            .filter(|r| r.risk == risk)
            .map(|r| r.task_id.clone())
            .collect()
    };

    let slack_days = project
        .target_date
        .signed_duration_since(estimated_completion)
        .num_days();

    let risk = if open.is_empty() {
        RiskLabel::OnTrack
    } else if project.target_date < today {
        RiskLabel::OverdueLikely
    } else if slack_days < 0 {
        RiskLabel::AtRisk
    } else {
        RiskLabel::OnTrack
    };

    ProjectForecast {
        project_id: project.id.clone(),
        estimated_completion,
        target_date: project.target_date,
        slack_days,
        risk,
        critical_path,
        remaining_tasks: open.len(),
        remaining_hours,
        at_risk: ids_with(RiskLabel::AtRisk),
        overdue: ids_with(RiskLabel::OverdueLikely),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::estimator::{estimate, EstimatorConfig};
    use crate::domain::task::{Task, TaskStatus};
    use chrono::TimeDelta;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + TimeDelta::days(n)
    }

    fn id(s: &str) -> TaskId {
        TaskId::new(s).unwrap()
    }

    fn task(name: &str, effort: f64, deps: &[&str]) -> Task {
        let mut task = Task::new(id(name), name, effort);
        for dep in deps {
            task.add_dependency(id(dep));
        }
        task
    }

    fn forecast_for(tasks: &[Task], target: NaiveDate, today: NaiveDate) -> ProjectForecast {
        let mut project = Project::new(ProjectId::new("p").unwrap(), "P", target);
        for task in tasks {
            project.add_task(task.id.clone());
        }
        let results = estimate(&project, tasks, today, &EstimatorConfig::default()).unwrap();
        forecast(&project, &results, today)
    }

    #[test]
    fn completion_and_critical_path() {
        let tasks = [
            task("design", 8.0, &[]),
            task("build", 24.0, &["design"]),
            task("docs", 4.0, &["design"]),
            task("ship", 8.0, &["build", "docs"]),
        ];
        let f = forecast_for(&tasks, day(10), day(0));

        assert_eq!(f.estimated_completion, day(5));
        assert_eq!(f.slack_days, 5);
        assert_eq!(f.risk, RiskLabel::OnTrack);
        assert_eq!(f.critical_path, vec![id("design"), id("build"), id("ship")]);
        assert_eq!(f.remaining_tasks, 4);
        assert_eq!(f.remaining_hours, 44.0);
    }

    #[test]
    fn late_project_is_at_risk() {
        let tasks = [task("a", 40.0, &[])];
        let f = forecast_for(&tasks, day(3), day(0));

        assert_eq!(f.estimated_completion, day(5));
        assert_eq!(f.slack_days, -2);
        assert_eq!(f.risk, RiskLabel::AtRisk);
    }

    #[test]
    fn passed_target_is_overdue() {
        let tasks = [task("a", 8.0, &[])];
        let f = forecast_for(&tasks, day(-1), day(0));
        assert_eq!(f.risk, RiskLabel::OverdueLikely);
    }

    #[test]
    fn finished_project_is_on_track() {
        let mut a = task("a", 8.0, &[]);
        a.status = TaskStatus::Done;
        a.completed_on = Some(day(-4));

        let f = forecast_for(&[a], day(-1), day(0));
        assert_eq!(f.risk, RiskLabel::OnTrack);
        assert_eq!(f.remaining_tasks, 0);
        assert_eq!(f.estimated_completion, day(-4));
    }

    #[test]
    fn empty_project_completes_today() {
        let f = forecast_for(&[], day(7), day(0));
        assert_eq!(f.estimated_completion, day(0));
        assert!(f.critical_path.is_empty());
        assert_eq!(f.slack_days, 7);
    }

    #[test]
    fn non_member_tasks_are_ignored() {
        let tasks = [task("a", 8.0, &[]), task("other", 80.0, &[])];
        let mut project = Project::new(ProjectId::new("p").unwrap(), "P", day(5));
        project.add_task(id("a"));

        let results = estimate(&project, &tasks, day(0), &EstimatorConfig::default()).unwrap();
        let f = forecast(&project, &results, day(0));

        assert_eq!(f.estimated_completion, day(1));
        assert_eq!(f.remaining_tasks, 1);
    }

    #[test]
    fn critical_path_follows_dependencies_outside_project() {
        let tasks = [task("platform", 16.0, &[]), task("a", 8.0, &["platform"])];
        let mut project = Project::new(ProjectId::new("p").unwrap(), "P", day(5));
        project.add_task(id("a"));

        let results = estimate(&project, &tasks, day(0), &EstimatorConfig::default()).unwrap();
        let f = forecast(&project, &results, day(0));

        assert_eq!(f.critical_path, vec![id("platform"), id("a")]);
        assert_eq!(f.estimated_completion, day(3));
    }
}
