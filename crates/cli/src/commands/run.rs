// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sluice run --catalog <file> --output <dir>` - Run one sync from stdin
//!
//! Each stdin line is one message. Records are written as JSON lines under
//! the output directory; committed checkpoints are printed to stdout with
//! their destination stats.

use anyhow::{Context, Result};
use clap::Args;
use sluice_adapters::{JsonlFlush, TracedFlush};
use sluice_core::{Catalog, CommittedCheckpoint, DecodeError, EngineConfig};
use sluice_engine::{ConsumerError, StreamConsumer};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args)]
pub struct RunArgs {
    /// Configured catalog (JSON) listing the streams of this sync
    #[arg(long)]
    pub catalog: PathBuf,

    /// Directory for the per-stream output files
    #[arg(long)]
    pub output: PathBuf,

    /// Preferred flush batch size in bytes
    #[arg(long)]
    pub batch_size: Option<u64>,
}

pub async fn run(args: RunArgs, config: EngineConfig) -> Result<()> {
    let catalog_json = std::fs::read_to_string(&args.catalog)
        .with_context(|| format!("failed to read catalog {}", args.catalog.display()))?;
    let catalog = Catalog::from_configured_catalog_json(&catalog_json)?;

    let mut destination = JsonlFlush::new(&args.output);
    if let Some(bytes) = args.batch_size {
        destination = destination.with_optimal_batch_size(bytes);
    }

    let mut consumer = StreamConsumer::new(
        config,
        catalog,
        TracedFlush::new(destination),
        print_checkpoint,
    );
    consumer.start().await?;

    let ingest = ingest(&mut consumer).await;
    let closed = consumer.close().await;
    ingest?;
    closed?;
    Ok(())
}

async fn ingest(consumer: &mut StreamConsumer<TracedFlush<JsonlFlush>>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0u64;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match consumer.accept(&line, line.len() as u64) {
            Ok(()) => {}
            Err(ConsumerError::Decode(DecodeError::UnsupportedType(kind))) => {
                tracing::debug!(line = line_number, kind = %kind, "skipping unsupported message");
            }
            Err(e) => return Err(e).with_context(|| format!("line {}", line_number)),
        }
    }
    Ok(())
}

fn print_checkpoint(checkpoint: CommittedCheckpoint) {
    let line = match checkpoint.to_message_with_stats() {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, "could not attach destination stats");
            checkpoint.message.serialized_state
        }
    };
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", line).and_then(|()| stdout.flush()) {
        tracing::error!(error = %e, "failed to write checkpoint to stdout");
    }
}
