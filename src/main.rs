//! Deadline CLI - deadline risk and priority estimation

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = deadline_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
