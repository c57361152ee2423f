//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create a `.deadline/` workspace, optionally seeded from a snapshot |
//! | `estimate` | Recommended due date, risk and rank per task |
//! | `forecast` | Project completion against the target date |
//! | `insights` | Workload buckets, top priorities, recommendations |
//! | `check` | Validate a snapshot without estimating |
//! | `transition` | Change a workspace task's status |
//! | `export` | Write the workspace to a snapshot file |
//! | `config show` | Print the layered configuration |
//!
//! Estimation commands read `--snapshot FILE` when given, otherwise the
//! workspace containing the current directory.
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! deadline --verbose estimate --today 2025-01-01
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod config_cmd;
mod estimate;
mod output;
mod task;

pub use app::{parse_date, run, Cli, Commands, InputArgs};
pub use output::{Output, OutputFormat};
