//! simtool
//!
//! Installs, updates and reports on the circuit simulation and EDA tools
//! (ngspice, KiCad, Xyce) through the host's package manager

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::Result;
use simtool_core::{Orchestrator, ToolRegistry};
use simtool_exec::{CommandExecutor, LocalExecutor};
use simtool_pkg::{DistroInfo, Platform, SudoPolicy, resolve_sudo, select_package_manager};
use tracing::{debug, warn};

mod config;
mod doctor;
mod logging;
mod render;

use config::Settings;
use doctor::Diagnostics;

/// Install and update circuit simulation tools
#[derive(Parser, Debug)]
#[command(name = "simtool", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tool registry file replacing the built-in catalog
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run package manager commands through sudo (auto, always, never)
    #[arg(long, global = true)]
    sudo: Option<SudoPolicy>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the status of every tool
    List,
    /// Install a tool and its dependencies
    Install {
        tool: String,
        /// Show the plan without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Upgrade outdated tools, or a single tool
    Update {
        tool: Option<String>,
        /// Only report available updates
        #[arg(long)]
        check: bool,
    },
    /// Remove a tool
    Uninstall { tool: String },
    /// Show platform, package manager and registry diagnostics
    Doctor,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let settings = Settings::load_default(cli.config.as_deref())?;
    logging::init(&settings.log, cli.verbose, cli.log_file.as_deref())?;

    match &settings.source {
        Some(path) => debug!(path = %path.display(), "loaded settings"),
        None => warn!("no settings file found, using defaults"),
    }

    let registry_path = settings.registry_path(cli.registry.as_deref());
    let registry = match &registry_path {
        Some(path) => ToolRegistry::load(path)?,
        None => ToolRegistry::builtin()?,
    };

    let platform = Platform::current()?;
    let distro = match platform {
        Platform::Linux => DistroInfo::detect(),
        Platform::Windows | Platform::Macos => None,
    };
    if platform == Platform::Linux && distro.is_none() {
        warn!("could not read os-release, probing for a package manager");
    }

    let executor: Arc<dyn CommandExecutor> = Arc::new(LocalExecutor::new());
    let sudo_policy = cli.sudo.unwrap_or(settings.sudo);
    let use_sudo = resolve_sudo(sudo_policy, platform, executor.as_ref()).await;
    let manager = select_package_manager(platform, distro.as_ref(), executor, use_sudo);
    let orchestrator = Orchestrator::new(registry, manager, platform);

    let success = match cli.command {
        Commands::List => {
            render::statuses(&orchestrator.list().await, cli.json)?;
            true
        }
        Commands::Install {
            tool,
            dry_run: true,
        } => {
            render::plan(&orchestrator.plan(&tool).await?, cli.json)?;
            true
        }
        Commands::Install { tool, .. } => {
            let report = orchestrator.install(&tool).await?;
            render::report(&report, cli.json)?;
            report.is_success()
        }
        Commands::Update { tool, check: true } => {
            let updates = match tool {
                Some(tool) => {
                    orchestrator.registry().lookup(&tool)?;
                    orchestrator
                        .check_updates()
                        .await
                        .into_iter()
                        .filter(|s| s.tool_id == tool)
                        .collect()
                }
                None => orchestrator.check_updates().await,
            };
            render::statuses(&updates, cli.json)?;
            true
        }
        Commands::Update { tool: Some(tool), .. } => {
            let report = orchestrator.update_tool(&tool).await?;
            render::report(&report, cli.json)?;
            report.is_success()
        }
        Commands::Update { tool: None, .. } => {
            let report = orchestrator.update().await;
            render::report(&report, cli.json)?;
            report.is_success()
        }
        Commands::Uninstall { tool } => {
            let report = orchestrator.uninstall(&tool).await?;
            render::report(&report, cli.json)?;
            report.is_success()
        }
        Commands::Doctor => {
            let source = registry_path.map(|p| p.display().to_string());
            let diagnostics = Diagnostics::collect(&orchestrator, distro.as_ref(), use_sudo, source);
            render::diagnostics(&diagnostics, cli.json)?;
            diagnostics.is_healthy()
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
