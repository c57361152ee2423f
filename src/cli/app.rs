//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{config_cmd, estimate, task};
use crate::domain::{self, Project, ProjectId};
use crate::storage::{Config, Snapshot, Workspace};

#[derive(Parser)]
#[command(name = "deadline")]
#[command(author, version, about = "Deadline risk and priority estimation for project tasks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured `default_format`)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the project and tasks come from, and the estimation date
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Read project and tasks from a JSON/YAML snapshot instead of the workspace
    #[arg(long, short = 's')]
    pub snapshot: Option<PathBuf>,

    /// Estimation date (YYYY-MM-DD or "today")
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    /// Working hours available per day
    #[arg(long, env = "DEADLINE_HOURS_PER_DAY")]
    pub hours_per_day: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new deadline workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Project identifier (derived from the name if omitted)
        #[arg(long)]
        id: Option<String>,

        /// Project name
        #[arg(long)]
        name: Option<String>,

        /// Project target date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        target: Option<NaiveDate>,

        /// Seed the workspace from a snapshot file
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Estimate due dates, risk and priority for every task
    Estimate {
        #[command(flatten)]
        input: InputArgs,

        /// Show how each estimate was derived
        #[arg(long, short = 'e')]
        explain: bool,
    },

    /// Forecast project completion against the target date
    Forecast {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show workload, top priorities and recommendations
    Insights {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Validate tasks and dependencies without estimating
    Check {
        /// Snapshot file to check instead of the workspace
        #[arg(long, short = 's')]
        snapshot: Option<PathBuf>,
    },

    /// Change the status of a workspace task
    Transition {
        /// Task ID
        task: String,

        /// New status (not_started, in_progress, blocked, done)
        status: String,

        /// Date the change happened (defaults to today)
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDate>,
    },

    /// Write the workspace project and tasks to a JSON/YAML snapshot file
    Export {
        /// Output file (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let format = cli.format.unwrap_or(config.settings.default_format);
    let output = Output::new(format, cli.verbose);

    output.verbose("deadline starting");
    if let Some(root) = &config.workspace_root {
        output.verbose(&format!("Workspace root: {}", root.display()));
    }

    match cli.command {
        Commands::Init { path, id, name, target, from } => {
            init(&output, &config, path, id, name, target, from)?
        }

        Commands::Estimate { input, explain } => {
            output.verbose_ctx("estimate", &format!("Input: {:?}, explain={}", input, explain));
            estimate::estimate(&output, &input, explain)?
        }
        Commands::Forecast { input } => {
            output.verbose_ctx("forecast", &format!("Input: {:?}", input));
            estimate::forecast(&output, &input)?
        }
        Commands::Insights { input } => {
            output.verbose_ctx("insights", &format!("Input: {:?}", input));
            estimate::insights(&output, &input)?
        }
        Commands::Check { snapshot } => {
            output.verbose_ctx("check", &format!("Snapshot: {:?}", snapshot));
            estimate::check(&output, snapshot.as_deref())?
        }

        Commands::Transition { task: id, status, on } => {
            task::transition(&output, &id, &status, on.unwrap_or_else(today))?
        }

        Commands::Export { file } => export(&output, &file)?,

        Commands::Config(cmd) => config_cmd::run(cmd, &output, &config)?,
    }

    Ok(())
}

fn init(
    output: &Output,
    config: &Config,
    path: PathBuf,
    id: Option<String>,
    name: Option<String>,
    target: Option<NaiveDate>,
    from: Option<PathBuf>,
) -> Result<()> {
    output.verbose_ctx("init", &format!("Initializing workspace at: {}", path.display()));

    let (mut project, tasks) = match from {
        Some(file) => {
            output.verbose_ctx("init", &format!("Seeding from snapshot: {}", file.display()));
            let snapshot = Snapshot::load(&file)?;
            (snapshot.project, snapshot.tasks)
        }
        None => {
            let name = name
                .clone()
                .ok_or_else(|| anyhow!("--name is required unless --from is given"))?;
            let target = target
                .ok_or_else(|| anyhow!("--target is required unless --from is given"))?;
            let id = match &id {
                Some(id) => ProjectId::new(id)?,
                None => ProjectId::new(&slugify(&name))?,
            };
            (Project::new(id, name, target), Vec::new())
        }
    };

    // Explicit flags win over the snapshot's project
    if let Some(id) = id {
        project.id = ProjectId::new(&id)?;
    }
    if let Some(name) = name {
        project.name = name;
    }
    if let Some(target) = target {
        project.target_date = target;
    }

    domain::validate(&project, &tasks, &config.settings.estimator)?;

    let workspace = Workspace::init(&path, &project, &tasks)?;
    output.verbose_ctx(
        "init",
        &format!("Created workspace directory at: {}", workspace.workspace_dir().display()),
    );
    output.success(&format!(
        "Initialized deadline workspace for '{}' ({} tasks) at {}",
        project.name,
        tasks.len(),
        workspace.root().display()
    ));

    Ok(())
}

fn export(output: &Output, file: &Path) -> Result<()> {
    let workspace = Workspace::open_current()?;
    let snapshot = workspace.snapshot()?;
    output.verbose_ctx(
        "export",
        &format!("Writing {} tasks to {}", snapshot.tasks.len(), file.display()),
    );

    snapshot.save(file)?;
    output.success(&format!(
        "Exported {} tasks to {}",
        snapshot.tasks.len(),
        file.display()
    ));

    Ok(())
}

/// Parses a `YYYY-MM-DD` date, or the word `today`
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(today());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// The local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
