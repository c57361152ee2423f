//! Estimation commands (estimate, forecast, insights, check)
//!
//! Each command reads a snapshot either from `--snapshot` or from the
//! current workspace, then runs the estimator against an explicit date.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use super::app::{today, InputArgs};
use super::output::Output;
use crate::domain::{self, EstimationResult, Severity, TaskId};
use crate::storage::{Config, Snapshot, Workspace};

/// Loads the snapshot and effective configuration for a command
fn load_input(output: &Output, ctx: &str, snapshot: Option<&Path>) -> Result<(Snapshot, Config)> {
    match snapshot {
        Some(path) => {
            output.verbose_ctx(ctx, &format!("Reading snapshot: {}", path.display()));
            Ok((Snapshot::load(path)?, Config::load()?))
        }
        None => {
            let workspace = Workspace::open_current()?;
            output.verbose_ctx(
                ctx,
                &format!("Opened workspace at: {}", workspace.root().display()),
            );
            Ok((workspace.snapshot()?, workspace.config().clone()))
        }
    }
}

struct Prepared {
    snapshot: Snapshot,
    config: Config,
    today: NaiveDate,
    results: Vec<EstimationResult>,
}

fn prepare(output: &Output, ctx: &str, input: &InputArgs) -> Result<Prepared> {
    let (snapshot, mut config) = load_input(output, ctx, input.snapshot.as_deref())?;

    if let Some(hours) = input.hours_per_day {
        output.verbose_ctx(ctx, &format!("Overriding hours per day: {}", hours));
        config.set_hours_per_day(hours)?;
    }

    let today = input.today.unwrap_or_else(today);
    output.verbose_ctx(
        ctx,
        &format!(
            "Estimating {} tasks as of {} ({} h/day)",
            snapshot.tasks.len(),
            today,
            config.settings.estimator.hours_per_day
        ),
    );

    let results = domain::estimate(
        &snapshot.project,
        &snapshot.tasks,
        today,
        &config.settings.estimator,
    )?;

    Ok(Prepared {
        snapshot,
        config,
        today,
        results,
    })
}

/// Estimate every task and print the ranked list
pub fn estimate(output: &Output, input: &InputArgs, explain: bool) -> Result<()> {
    let Prepared {
        snapshot,
        config,
        today,
        results,
    } = prepare(output, "estimate", input)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "project_id": snapshot.project.id,
            "today": today,
            "hours_per_day": config.settings.estimator.hours_per_day,
            "results": results,
        }));
        return Ok(());
    }

    let titles: HashMap<&TaskId, &str> = snapshot
        .tasks
        .iter()
        .map(|t| (&t.id, t.title.as_str()))
        .collect();

    println!(
        "Project: {} ({}), target {}",
        snapshot.project.name, snapshot.project.id, snapshot.project.target_date
    );
    println!(
        "Estimated as of {} with {} h/day",
        today, config.settings.estimator.hours_per_day
    );
    println!();

    if results.is_empty() {
        println!("No tasks to estimate.");
        return Ok(());
    }

    println!(
        "{:<5} {:<20} {:<11} {:<15} {:>7}  TITLE",
        "RANK", "ID", "DUE", "RISK", "SCORE"
    );
    println!("{}", "-".repeat(80));
    for result in &results {
        println!(
            "{:<5} {:<20} {:<11} {:<15} {:>7.3}  {}",
            result.priority_rank,
            result.task_id.as_str(),
            result.recommended_due_date.to_string(),
            result.risk.label(),
            result.explanation.score,
            titles.get(&result.task_id).copied().unwrap_or("")
        );
        if explain {
            print_explanation(result);
        }
    }

    Ok(())
}

fn print_explanation(result: &EstimationResult) {
    let e = &result.explanation;

    let mut line = format!(
        "      {}, {:.1}h = {:.2} days, start day {:.2}, finish day {:.2}",
        e.status, e.effort_hours, e.effort_days, e.start_offset_days, e.finish_offset_days
    );
    if let Some(dep) = &e.driven_by {
        line.push_str(&format!(" (after {})", dep));
    }
    println!("{}", line);

    let mut line = format!(
        "      urgency {:.3} ({} days left), fan-out {}",
        e.urgency, e.days_until_due, e.fan_out
    );
    if let Some(hint) = e.hint {
        line.push_str(&format!(", hint {} x{}", hint, e.hint_multiplier));
    }
    if let Some(due) = e.declared_due_date {
        line.push_str(&format!(", declared due {}", due));
    }
    println!("{}", line);
}

/// Forecast project completion
pub fn forecast(output: &Output, input: &InputArgs) -> Result<()> {
    let prepared = prepare(output, "forecast", input)?;
    let project = &prepared.snapshot.project;
    let forecast = domain::forecast(project, &prepared.results, prepared.today);

    output.verbose_ctx(
        "forecast",
        &format!("Critical path has {} tasks", forecast.critical_path.len()),
    );

    if output.is_json() {
        output.data(&forecast);
        return Ok(());
    }

    let slack = match forecast.slack_days {
        d if d < 0 => format!("{} days late", -d),
        d => format!("{} days slack", d),
    };
    let join = |ids: &[TaskId], sep: &str| -> String {
        if ids.is_empty() {
            "-".to_string()
        } else {
            ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(sep)
        }
    };

    println!("Forecast for {} ({})", project.name, project.id);
    println!("  Estimated completion: {}", forecast.estimated_completion);
    println!("  Target date:          {} ({})", forecast.target_date, slack);
    println!("  Risk:                 {}", forecast.risk);
    println!(
        "  Remaining:            {} tasks, {:.1} hours",
        forecast.remaining_tasks, forecast.remaining_hours
    );
    println!("  Critical path:        {}", join(&forecast.critical_path, " -> "));
    println!("  At risk:              {}", join(&forecast.at_risk, ", "));
    println!("  Overdue-likely:       {}", join(&forecast.overdue, ", "));

    Ok(())
}

/// Show the daily insight report
pub fn insights(output: &Output, input: &InputArgs) -> Result<()> {
    let prepared = prepare(output, "insights", input)?;
    let report = domain::insights(
        &prepared.snapshot.tasks,
        &prepared.results,
        prepared.today,
        &prepared.config.settings.insights,
    );

    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    let s = &report.summary;
    println!("Insights for {}", report.generated_for);
    println!(
        "Tasks: {} total, {} done, {} pending, {} overdue",
        s.total, s.done, s.pending, s.overdue
    );
    match report.next_deadline {
        Some(date) => println!("Next deadline: {}", date),
        None => println!("Next deadline: none"),
    }
    let w = &report.workload;
    println!(
        "Workload (hours): overdue {:.1}, today {:.1}, this week {:.1}, later {:.1}, total {:.1}",
        w.overdue, w.today, w.this_week, w.later, w.total()
    );

    println!();
    if report.priorities.is_empty() {
        println!("No open tasks.");
    } else {
        println!("Top priorities:");
        for entry in &report.priorities {
            println!(
                "  {}. {:<20} {} (due {}, {}, {:.1}h)",
                entry.rank,
                entry.task_id.as_str(),
                entry.title,
                entry.recommended_due_date,
                entry.risk,
                entry.effort_hours
            );
        }
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for rec in &report.recommendations {
            let tag = match rec.severity {
                Severity::Critical => "critical",
                Severity::Warning => "warning",
                Severity::Info => "info",
            };
            println!("  [{}] {}", tag, rec.message);
        }
    }

    Ok(())
}

/// Validate a snapshot without estimating
pub fn check(output: &Output, snapshot: Option<&Path>) -> Result<()> {
    let (snapshot, config) = load_input(output, "check", snapshot)?;

    let graph = domain::validate(&snapshot.project, &snapshot.tasks, &config.settings.estimator)?;
    let edges: usize = snapshot.tasks.iter().map(|t| t.depends_on.len()).sum();

    output.verbose_ctx(
        "check",
        &format!("Validated {} tasks and {} dependencies", graph.len(), edges),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "valid": true,
            "project_id": snapshot.project.id,
            "tasks": graph.len(),
            "dependencies": edges,
        }));
    } else {
        println!(
            "OK: {} tasks, {} dependencies in project '{}', no problems found",
            graph.len(),
            edges,
            snapshot.project.id
        );
    }

    Ok(())
}
