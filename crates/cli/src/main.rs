// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sluice - buffer a sync's record stream into a destination

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, run};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sluice",
    version,
    about = "Sluice - buffered destination writes with checkpoint commits"
)]
struct Cli {
    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read messages from stdin and write records to a directory
    Run(run::RunArgs),
    /// Print the effective engine config
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::setup(cli.log_file.as_deref())?;

    let engine_config = config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Run(args) => run::run(args, engine_config).await,
        Commands::Config => config::show(&engine_config),
    }
}
