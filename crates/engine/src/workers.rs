// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flush worker pool
//!
//! Each worker loops: pick the most eligible stream, drain a batch capped at
//! the destination's optimal size, flush it, then return its memory and
//! advance checkpoints. Each flush runs in its own task so a panic is seen
//! as a failure. A failed flush is recorded in the shared failure cell and
//! stops the worker; every other worker stops at its next turn.

use crate::emit::CheckpointEmitter;
use crate::error::FatalError;
use crate::failure::FlushFailure;
use sluice_adapters::FlushFunction;
use sluice_core::BufferManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Everything a pool shares with its workers
pub struct PoolDeps<F> {
    pub buffers: Arc<BufferManager>,
    pub flush: F,
    pub failure: FlushFailure,
    pub emitter: Arc<CheckpointEmitter>,
}

struct Shared<F> {
    deps: PoolDeps<F>,
    closing: Arc<AtomicBool>,
    idle_wait: Duration,
}

/// A fixed set of tokio tasks flushing buffered records
pub struct FlushWorkerPool {
    closing: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
    failure: FlushFailure,
}

impl FlushWorkerPool {
    /// Spawn `worker_count` workers on the current tokio runtime
    pub fn start<F: FlushFunction>(
        deps: PoolDeps<F>,
        worker_count: usize,
        idle_wait: Duration,
    ) -> Self {
        let failure = deps.failure.clone();
        let closing = Arc::new(AtomicBool::new(false));
        let shared = Arc::new(Shared {
            deps,
            closing: Arc::clone(&closing),
            idle_wait,
        });

        let handles = (0..worker_count)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&shared))))
            .collect();
        tracing::debug!(workers = worker_count, "flush workers started");

        Self {
            closing,
            handles,
            failure,
        }
    }

    /// Make every non-empty stream eligible and let workers exit once all
    /// buffers are drained
    pub fn request_close(&self) {
        self.closing.store(true, Ordering::Release);
    }

    /// Request close and wait for every worker to exit
    pub async fn close(self) {
        self.request_close();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "flush worker terminated abnormally");
                self.failure.record(FatalError::Worker(e.to_string()));
            }
        }
        tracing::debug!("flush workers stopped");
    }
}

impl std::fmt::Debug for FlushWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushWorkerPool")
            .field("workers", &self.handles.len())
            .finish()
    }
}

async fn run_worker<F: FlushFunction>(id: usize, shared: Arc<Shared<F>>) {
    let deps = &shared.deps;
    let threshold = deps.flush.queue_flush_threshold_bytes();
    let max_batch = deps.flush.optimal_batch_size_bytes();

    loop {
        if deps.failure.is_failed() {
            tracing::debug!(worker = id, "stopping after failure");
            break;
        }

        let closing = shared.closing.load(Ordering::Acquire);
        let Some(stream) = deps.buffers.select_stream_to_flush(threshold, closing) else {
            if closing && deps.buffers.is_drained() {
                break;
            }
            tokio::time::sleep(shared.idle_wait).await;
            continue;
        };

        // Another worker may have taken it since selection
        let Some(mut batch) = deps.buffers.drain_up_to(&stream, Some(max_batch)) else {
            continue;
        };

        let records = batch.take_records();
        tracing::debug!(
            worker = id,
            stream = %stream,
            records = batch.record_count(),
            bytes = batch.size_bytes(),
            "flushing batch"
        );

        // A panicking destination must still release the stream
        let flush = deps.flush.clone();
        let target = stream.clone();
        let outcome = tokio::spawn(async move { flush.flush(&target, records).await }).await;

        match outcome {
            Ok(Ok(())) => {
                let records = batch.record_count();
                let promoted = deps.buffers.complete(batch, true);
                tracing::debug!(worker = id, stream = %stream, records, promoted, "batch flushed");
                if promoted > 0 {
                    deps.emitter.emit_committed(deps.buffers.checkpoints());
                }
            }
            Ok(Err(e)) => {
                tracing::error!(worker = id, stream = %stream, error = %e, "flush failed");
                deps.buffers.complete(batch, false);
                deps.failure.record(FatalError::Flush(e));
                break;
            }
            Err(e) => {
                tracing::error!(worker = id, stream = %stream, error = %e, "flush task aborted");
                deps.buffers.complete(batch, false);
                deps.failure
                    .record(FatalError::Worker(format!("flush of {} failed: {}", stream, e)));
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
