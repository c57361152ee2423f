//! Workload distribution and recommendations
//!
//! Summaries built on top of an estimation run: how much open effort is due
//! when, and what deserves attention first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::estimator::{EstimationResult, RiskLabel};
use super::id::TaskId;
use super::task::{PriorityHint, Task, TaskStatus};

/// Thresholds for insight generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Hours due by tomorrow above which a heavy-workload warning is raised
    pub heavy_workload_hours: f64,

    /// Days counted as "this week"
    pub week_horizon_days: i64,

    /// Number of tasks listed in the priority summary
    pub top_priorities: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            heavy_workload_hours: 10.0,
            week_horizon_days: 7,
            top_priorities: 5,
        }
    }
}

/// Open effort hours bucketed by recommended due date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Recommended due date already passed
    pub overdue: f64,
    /// Due by the start of tomorrow
    pub today: f64,
    pub this_week: f64,
    pub later: f64,
}

impl Workload {
    pub fn total(&self) -> f64 {
        self.overdue + self.today + self.this_week + self.later
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Overdue,
    AtRisk,
    HeavyWorkload,
    StartUrgent,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub rank: usize,
    pub task_id: TaskId,
    pub title: String,
    pub recommended_due_date: NaiveDate,
    pub risk: RiskLabel,
    pub effort_hours: f64,
}

/// Daily insight report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub generated_for: NaiveDate,
    pub summary: Summary,
    pub workload: Workload,
    /// Earliest declared due date of unfinished work that has not passed yet
    pub next_deadline: Option<NaiveDate>,
    pub priorities: Vec<PriorityEntry>,
    pub recommendations: Vec<Recommendation>,
}

/// Buckets the effort of unfinished tasks by recommended due date
pub fn workload(results: &[EstimationResult], config: &InsightsConfig) -> Workload {
    let mut workload = Workload::default();

    for result in results {
        if result.explanation.status.is_complete() {
            continue;
        }

        let hours = result.explanation.effort_hours;
        match result.explanation.days_until_due {
            d if d < 0 => workload.overdue += hours,
            d if d <= 1 => workload.today += hours,
            d if d <= config.week_horizon_days => workload.this_week += hours,
            _ => workload.later += hours,
        }
    }

    workload
}

/// Produces recommendations, most severe first
pub fn recommendations(
    tasks: &[Task],
    results: &[EstimationResult],
    workload: &Workload,
    config: &InsightsConfig,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    let with_risk = |risk: RiskLabel| -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = results
            .iter()
            .filter(|r| r.risk == risk)
            .map(|r| r.task_id.clone())
            .collect();
        ids.sort();
        ids
    };

    let overdue = with_risk(RiskLabel::OverdueLikely);
    if !overdue.is_empty() {
        recs.push(Recommendation {
            severity: Severity::Critical,
            category: Category::Overdue,
            message: format!(
                "{} task(s) are likely to miss their deadline. Prioritize them immediately.",
                overdue.len()
            ),
            tasks: overdue,
        });
    }

    let at_risk = with_risk(RiskLabel::AtRisk);
    if !at_risk.is_empty() {
        recs.push(Recommendation {
            severity: Severity::Warning,
            category: Category::AtRisk,
            message: format!(
                "{} task(s) have a declared due date their dependency chain cannot meet.",
                at_risk.len()
            ),
            tasks: at_risk,
        });
    }

    if workload.today > config.heavy_workload_hours {
        recs.push(Recommendation {
            severity: Severity::Warning,
            category: Category::HeavyWorkload,
            message: format!(
                "{:.1} hours of work are due by tomorrow. Consider adjusting the schedule.",
                workload.today
            ),
            tasks: Vec::new(),
        });
    }

    let statuses: HashMap<TaskId, TaskStatus> =
        tasks.iter().map(|t| (t.id.clone(), t.status)).collect();

    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let start_urgent: Vec<TaskId> = sorted
        .iter()
        .filter(|t| {
            t.status.is_pending()
                && t.priority == Some(PriorityHint::High)
                && t.is_ready(&statuses)
        })
        .map(|t| t.id.clone())
        .collect();
    if !start_urgent.is_empty() {
        recs.push(Recommendation {
            severity: Severity::Info,
            category: Category::StartUrgent,
            message: format!(
                "Start {} high-priority task(s) that are ready but not started.",
                start_urgent.len()
            ),
            tasks: start_urgent,
        });
    }

    let blocked: Vec<TaskId> = sorted
        .iter()
        .filter(|t| t.status == TaskStatus::Blocked)
        .map(|t| t.id.clone())
        .collect();
    if !blocked.is_empty() {
        recs.push(Recommendation {
            severity: Severity::Info,
            category: Category::Blocked,
            message: format!("{} task(s) are blocked. Resolve blockers to keep the schedule.", blocked.len()),
            tasks: blocked,
        });
    }

    recs
}

/// Builds the full insight report
///
/// `results` is expected in rank order, as returned by [`super::estimate`].
pub fn insights(
    tasks: &[Task],
    results: &[EstimationResult],
    today: NaiveDate,
    config: &InsightsConfig,
) -> Insights {
    let titles: HashMap<&TaskId, &str> = tasks.iter().map(|t| (&t.id, t.title.as_str())).collect();

    let done = tasks.iter().filter(|t| t.status.is_complete()).count();
    let summary = Summary {
        total: tasks.len(),
        done,
        pending: tasks.len() - done,
        overdue: results
            .iter()
            .filter(|r| r.risk == RiskLabel::OverdueLikely)
            .count(),
    };

    let next_deadline = tasks
        .iter()
        .filter(|t| !t.status.is_complete())
        .filter_map(|t| t.due_date)
        .filter(|due| *due >= today)
        .min();

    let priorities = results
        .iter()
        .filter(|r| !r.explanation.status.is_complete())
        .take(config.top_priorities)
        .map(|r| PriorityEntry {
            rank: r.priority_rank,
            task_id: r.task_id.clone(),
            title: titles.get(&r.task_id).copied().unwrap_or_default().to_string(),
            recommended_due_date: r.recommended_due_date,
            risk: r.risk,
            effort_hours: r.explanation.effort_hours,
        })
        .collect();

    let workload = workload(results, config);
    let recommendations = recommendations(tasks, results, &workload, config);

    Insights {
        generated_for: today,
        summary,
        workload,
        next_deadline,
        priorities,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::estimator::{estimate, EstimatorConfig};
    use crate::domain::id::ProjectId;
    use crate::domain::project::Project;
    use chrono::TimeDelta;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + TimeDelta::days(n)
    }

    fn id(s: &str) -> TaskId {
        TaskId::new(s).unwrap()
    }

    fn task(name: &str, effort: f64, deps: &[&str]) -> Task {
        let mut task = Task::new(id(name), format!("Task {}", name), effort);
        for dep in deps {
            task.add_dependency(id(dep));
        }
        task
    }

    fn run(tasks: &[Task]) -> Vec<EstimationResult> {
        let mut project = Project::new(ProjectId::new("p").unwrap(), "P", day(30));
        for task in tasks {
            project.add_task(task.id.clone());
        }
        estimate(&project, tasks, day(0), &EstimatorConfig::default()).unwrap()
    }

    #[test]
    fn workload_buckets() {
        let mut late = task("late", 8.0, &[]);
        late.status = TaskStatus::InProgress;
        late.started_on = Some(day(-10));

        let mut finished = task("finished", 100.0, &[]);
        finished.status = TaskStatus::Done;

        let tasks = [
            late,                             // due day -9
            task("quick", 6.0, &[]),          // due day 1
            task("week", 40.0, &[]),          // due day 5
            task("month", 160.0, &[]),        // due day 20
            finished,
        ];
        let w = workload(&run(&tasks), &InsightsConfig::default());

        assert_eq!(w.overdue, 8.0);
        assert_eq!(w.today, 6.0);
        assert_eq!(w.this_week, 40.0);
        assert_eq!(w.later, 160.0);
        assert_eq!(w.total(), 214.0);
    }

    #[test]
    fn recommendations_in_severity_order() {
        let mut overdue = task("a", 8.0, &[]);
        overdue.set_due_date(day(-1));

        let mut at_risk = task("b", 24.0, &[]);
        at_risk.set_due_date(day(2));

        let mut urgent = task("c", 4.0, &[]);
        urgent.set_priority(PriorityHint::High);

        let mut blocked = task("d", 4.0, &[]);
        blocked.status = TaskStatus::Blocked;

        let tasks = [overdue, at_risk, urgent, blocked];
        let results = run(&tasks);
        let config = InsightsConfig::default();
        let recs = recommendations(&tasks, &results, &workload(&results, &config), &config);

        let categories: Vec<_> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Overdue,
                Category::AtRisk,
                Category::HeavyWorkload,
                Category::StartUrgent,
                Category::Blocked,
            ]
        );
        assert_eq!(recs[0].tasks, vec![id("a")]);
        assert_eq!(recs[1].tasks, vec![id("b")]);
        assert_eq!(recs[3].tasks, vec![id("c")]);
        assert_eq!(recs[4].tasks, vec![id("d")]);

        let severities: Vec<_> = recs.iter().map(|r| r.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
    }

    #[test]
    fn high_priority_waiting_on_dependency_is_not_flagged() {
        let dep = task("dep", 8.0, &[]);
        let mut urgent = task("urgent", 8.0, &["dep"]);
        urgent.set_priority(PriorityHint::High);

        let tasks = [dep, urgent];
        let results = run(&tasks);
        let config = InsightsConfig::default();
        let recs = recommendations(&tasks, &results, &workload(&results, &config), &config);

        assert!(recs.iter().all(|r| r.category != Category::StartUrgent));
    }

    #[test]
    fn quiet_snapshot_has_no_recommendations() {
        let tasks = [task("a", 8.0, &[])];
        let results = run(&tasks);
        let config = InsightsConfig::default();

        assert!(recommendations(&tasks, &results, &workload(&results, &config), &config).is_empty());
    }

    #[test]
    fn full_report() {
        let mut done = task("done", 8.0, &[]);
        done.status = TaskStatus::Done;

        let mut a = task("a", 8.0, &[]);
        a.set_due_date(day(4));
        let mut b = task("b", 8.0, &["a"]);
        b.set_due_date(day(9));

        let tasks = [done, a, b];
        let results = run(&tasks);
        let report = insights(&tasks, &results, day(0), &InsightsConfig::default());

        assert_eq!(report.generated_for, day(0));
        assert_eq!(
            report.summary,
            Summary {
                total: 3,
                done: 1,
                pending: 2,
                overdue: 0
            }
        );
        assert_eq!(report.next_deadline, Some(day(4)));

        // Completed work is left out of the priority list
        let listed: Vec<_> = report.priorities.iter().map(|p| p.task_id.as_str()).collect();
        assert_eq!(listed, vec!["a", "b"]);
        assert_eq!(report.priorities[0].title, "Task a");
    }

    #[test]
    fn priority_list_is_truncated() {
        let tasks: Vec<Task> = (0..8).map(|i| task(&format!("t{}", i), 8.0, &[])).collect();
        let results = run(&tasks);
        let config = InsightsConfig {
            top_priorities: 3,
            ..InsightsConfig::default()
        };

        assert_eq!(insights(&tasks, &results, day(0), &config).priorities.len(), 3);
    }
}
