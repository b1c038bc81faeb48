//! Disk I/O pressure injector.
//!
//! `start` detaches a worker that saturates a mount point's device with `dd`
//! reads and writes; `stop` kills it and removes its artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use burnio::core::types::{WorkerState, WorkloadSpec};
use burnio::exit_codes;
use burnio::io::artifacts::ArtifactPaths;
use burnio::io::channel::LocalChannel;
use burnio::io::config::{BurnioConfig, load_config};
use burnio::io::detach::LocalDetacher;
use burnio::io::registry::ProcfsRegistry;
use burnio::launch::{LaunchContext, launch};
use burnio::logging;
use burnio::terminate::terminate;
use burnio::worker::supervise;

#[derive(Parser)]
#[command(
    name = "burnio",
    version,
    about = "Disk I/O pressure injector for chaos experiments"
)]
struct Cli {
    /// TOML config file. Missing file means defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the log artifact and scratch file.
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start read and/or write pressure on the device behind a mount point.
    Start {
        #[arg(long)]
        mount_point: String,
        /// Device to stress; skips the mount table lookup.
        #[arg(long)]
        file_system: Option<String>,
        /// Block size in megabytes.
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        size: u64,
        /// Blocks per `dd` invocation.
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
        #[arg(long)]
        read: bool,
        #[arg(long)]
        write: bool,
    },
    /// Kill every stress process and remove the artifacts. Always succeeds.
    Stop,
    /// Run the stress loops in the foreground. Spawned by `start`.
    #[command(hide = true)]
    RunDetached {
        #[arg(long, default_value = "")]
        file_system: String,
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        size: u64,
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
        #[arg(long)]
        read: bool,
        #[arg(long)]
        write: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILURE);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = settings(cli.config.as_deref(), cli.artifact_dir)?;
    let paths = ArtifactPaths::new(&config.artifact_dir);
    let channel = LocalChannel::from_config(&config);
    let registry = ProcfsRegistry::new();

    match cli.command {
        Command::Start {
            mount_point,
            file_system,
            size,
            count,
            read,
            write,
        } => {
            let spec = WorkloadSpec {
                mount_point,
                file_system: file_system.unwrap_or_default(),
                block_size_mb: size,
                block_count: count,
                read,
                write,
            };
            let ctx = LaunchContext {
                channel: &channel,
                detacher: &LocalDetacher,
                registry: &registry,
                paths: &paths,
                worker_program: std::env::current_exe().context("locate burnio binary")?,
                config_path: cli.config,
                grace: config.grace_interval(),
            };
            match launch(&ctx, &spec) {
                Ok(outcome) => {
                    debug!(file_system = %outcome.file_system, "start finished");
                    println!("success");
                    Ok(exit_codes::OK)
                }
                Err(err) => {
                    eprintln!("{err}");
                    Ok(exit_codes::FAILURE)
                }
            }
        }
        Command::Stop => {
            let outcome = terminate(&channel, &registry, &paths);
            debug!(killed = outcome.killed, "stop finished");
            Ok(exit_codes::OK)
        }
        Command::RunDetached {
            file_system,
            size,
            count,
            read,
            write,
        } => {
            let spec = WorkloadSpec {
                mount_point: String::new(),
                file_system,
                block_size_mb: size,
                block_count: count,
                read,
                write,
            };
            match supervise(Arc::new(channel), &paths, &spec)? {
                WorkerState::Failed(_) => Ok(exit_codes::FAILURE),
                WorkerState::Running | WorkerState::Terminated => Ok(exit_codes::OK),
            }
        }
    }
}

/// Config file (or defaults) with the `--artifact-dir` override applied.
fn settings(config_path: Option<&Path>, artifact_dir: Option<PathBuf>) -> Result<BurnioConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => BurnioConfig::default(),
    };
    if let Some(dir) = artifact_dir {
        config.artifact_dir = dir;
    }
    Ok(config)
}
