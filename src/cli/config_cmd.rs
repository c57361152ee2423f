//! Configuration commands

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::storage::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration after layering
    Show,

    /// Show where configuration files are read from
    Path,
}

pub fn run(cmd: ConfigCommands, output: &Output, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(output, config),
        ConfigCommands::Path => path(output, config),
    }
}

fn show(output: &Output, config: &Config) -> Result<()> {
    if output.is_json() {
        output.data(&config.settings);
    } else {
        let toml = toml::to_string_pretty(&config.settings).context("Failed to serialize config")?;
        print!("{}", toml);
    }
    Ok(())
}

fn path(output: &Output, config: &Config) -> Result<()> {
    let global = Config::global_config_dir().map(|dir| dir.join("config.toml"));
    let workspace = config
        .workspace_root
        .as_ref()
        .map(|root| root.join(crate::storage::WORKSPACE_DIR).join("config.toml"));

    if output.is_json() {
        output.data(&serde_json::json!({
            "global": global,
            "workspace": workspace,
        }));
    } else {
        let show = |p: Option<std::path::PathBuf>| {
            p.map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        };
        println!("global:    {}", show(global));
        println!("workspace: {}", show(workspace));
    }
    Ok(())
}
