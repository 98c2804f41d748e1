//! CLI entry point for tasksync.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasksync_app::config::{CONFIG_FILE, ClientConfig};
use tasksync_core::FilterMode;
use tasksync_core::id::TaskId;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;
mod render;

/// Task list client for a REST todo service.
#[derive(Parser, Debug)]
#[command(
    name = "tasksync",
    version,
    about = "tasksync: a task list kept in sync with a remote todo service"
)]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Owner id (overrides the config file and TASKSYNC_OWNER_ID).
    #[arg(long)]
    owner: Option<u64>,

    /// Service root (overrides the config file and TASKSYNC_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Show the task list.
    List {
        #[arg(long, default_value_t = FilterMode::All)]
        filter: FilterMode,
    },

    /// Create a task.
    Add { title: String },

    /// Flip the completion flag of a task.
    Toggle { id: TaskId },

    /// Rename a task; an empty title deletes it.
    Edit { id: TaskId, title: String },

    /// Delete a task.
    Rm { id: TaskId },

    /// Complete every active task, or reopen all when none is active.
    ToggleAll,

    /// Delete every completed task.
    ClearCompleted,
}

fn main() -> Result<ExitCode> {
    let Cli {
        config,
        owner,
        base_url,
        cmd,
    } = Cli::parse();

    install_tracing();

    let config = resolve_config(&config, owner, base_url)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(commands::run(cmd, &config))
}

/// File, then environment, then flags.
fn resolve_config(
    path: &Path,
    owner: Option<u64>,
    base_url: Option<String>,
) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(path)?.with_env_overrides()?;
    if let Some(owner) = owner {
        config.owner_id = Some(owner);
    }
    if let Some(base_url) = base_url {
        config.api.base_url = base_url;
    }
    config.validate()?;
    Ok(config)
}

fn install_tracing() {
    // RUST_LOG is honored; the default level is INFO.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
