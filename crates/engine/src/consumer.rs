// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest lifecycle: start, accept, close
//!
//! The consumer decodes each incoming message, buffers records, tracks
//! checkpoints, and surfaces any failure from the flush workers at the next
//! `accept` or `close`.

use crate::emit::CheckpointEmitter;
use crate::error::{ConsumerError, FatalError, HookError};
use crate::failure::FlushFailure;
use crate::workers::{FlushWorkerPool, PoolDeps};
use sluice_adapters::FlushFunction;
use sluice_core::{
    decode, BufferManager, Catalog, CheckpointManager, CheckpointScope, CommittedCheckpoint,
    DecodedMessage, EngineConfig, GlobalMemoryManager, StreamSummary,
};
use std::sync::Arc;

/// Called once before any message is accepted
pub type OnStart = Box<dyn FnOnce() -> Result<(), HookError> + Send>;
/// Called once at close with whether the run failed
pub type OnClose = Box<dyn FnOnce(bool) -> Result<(), HookError> + Send>;

enum Lifecycle {
    Created,
    Running(FlushWorkerPool),
    Closed,
}

/// Buffers one sync run's records and reports checkpoints once the data
/// they cover has been flushed
pub struct StreamConsumer<F> {
    config: EngineConfig,
    catalog: Catalog,
    flush: F,
    buffers: Arc<BufferManager>,
    failure: FlushFailure,
    emitter: Arc<CheckpointEmitter>,
    on_start: Option<OnStart>,
    on_close: Option<OnClose>,
    lifecycle: Lifecycle,
}

impl<F: FlushFunction> StreamConsumer<F> {
    pub fn new(
        config: EngineConfig,
        catalog: Catalog,
        flush: F,
        sink: impl FnMut(CommittedCheckpoint) + Send + 'static,
    ) -> Self {
        let memory = Arc::new(GlobalMemoryManager::with_block_size(
            config.max_memory_bytes,
            config.block_size_bytes,
        ));
        let buffers = BufferManager::new(memory, CheckpointManager::new(config.commit_mode))
            .with_max_time_between_flushes(config.max_time_between_flushes);

        Self {
            config,
            catalog,
            flush,
            buffers: Arc::new(buffers),
            failure: FlushFailure::new(),
            emitter: Arc::new(CheckpointEmitter::new(sink)),
            on_start: None,
            on_close: None,
            lifecycle: Lifecycle::Created,
        }
    }

    pub fn on_start(mut self, hook: impl FnOnce() -> Result<(), HookError> + Send + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn on_close(
        mut self,
        hook: impl FnOnce(bool) -> Result<(), HookError> + Send + 'static,
    ) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Run the start hook and spawn the flush workers.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&mut self) -> Result<(), ConsumerError> {
        match self.lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Running(_) | Lifecycle::Closed => return Err(ConsumerError::AlreadyStarted),
        }

        if let Some(hook) = self.on_start.take() {
            hook().map_err(ConsumerError::Hook)?;
        }

        let pool = FlushWorkerPool::start(
            PoolDeps {
                buffers: Arc::clone(&self.buffers),
                flush: self.flush.clone(),
                failure: self.failure.clone(),
                emitter: Arc::clone(&self.emitter),
            },
            self.config.worker_count,
            self.config.idle_wait,
        );
        self.lifecycle = Lifecycle::Running(pool);

        tracing::info!(
            streams = self.catalog.len(),
            workers = self.config.worker_count,
            max_memory_bytes = self.config.max_memory_bytes,
            commit_mode = ?self.config.commit_mode,
            "consumer started"
        );
        Ok(())
    }

    /// Decode and route one message.
    ///
    /// `size_hint` is the caller's estimate of the message's size; the
    /// larger of it and the decoder's estimate is charged to the buffer.
    pub fn accept(&mut self, text: &str, size_hint: u64) -> Result<(), ConsumerError> {
        match self.lifecycle {
            Lifecycle::Running(_) => {}
            Lifecycle::Created => return Err(ConsumerError::NotStarted),
            Lifecycle::Closed => return Err(ConsumerError::AlreadyClosed),
        }
        self.failure.check()?;

        let default_namespace = self.config.default_namespace.as_deref();
        match decode(text)? {
            DecodedMessage::Record(mut record) => {
                record.stream = record.stream.with_default_namespace(default_namespace);
                if let Err(e) = self.catalog.validate(&record.stream) {
                    return Err(self.fail(e.into()));
                }
                let size = record
                    .estimated_size()
                    .max(size_hint)
                    .saturating_add(self.config.record_overhead_bytes);
                self.buffers.enqueue(record, size);
            }
            DecodedMessage::Checkpoint(mut checkpoint) => {
                checkpoint.scope = match checkpoint.scope {
                    CheckpointScope::Stream(stream) => {
                        CheckpointScope::Stream(stream.with_default_namespace(default_namespace))
                    }
                    scope => scope,
                };
                let checkpoints = self.buffers.checkpoints();
                let watermark = self.buffers.watermark_for(&checkpoint.scope);
                if let Err(e) = checkpoints.add_marker(checkpoint, watermark) {
                    return Err(self.fail(e.into()));
                }
                if checkpoints.promote_covered() > 0 {
                    self.emitter.emit_committed(checkpoints);
                }
            }
        }
        Ok(())
    }

    /// Drain every buffer, report the final checkpoints, and run the close
    /// hook.
    ///
    /// A failure recorded at any point of the run, including the final
    /// drain, takes precedence over a close hook error.
    pub async fn close(&mut self) -> Result<(), ConsumerError> {
        let pool = match std::mem::replace(&mut self.lifecycle, Lifecycle::Closed) {
            Lifecycle::Running(pool) => pool,
            Lifecycle::Created => {
                self.lifecycle = Lifecycle::Created;
                return Err(ConsumerError::NotStarted);
            }
            Lifecycle::Closed => return Err(ConsumerError::AlreadyClosed),
        };

        tracing::info!(buffered_bytes = self.buffers.buffered_bytes(), "closing, draining buffers");
        pool.close().await;

        let failed = self.failure.is_failed();
        if !failed {
            let checkpoints = self.buffers.checkpoints();
            checkpoints.promote_covered();
            checkpoints.advance_flushed_to_committed();
            self.emitter.emit_committed(checkpoints);
        }

        let discarded = self.buffers.close();
        for summary in self.buffers.summary() {
            tracing::info!(
                stream = %summary.stream,
                enqueued = summary.enqueued,
                flushed = summary.flushed,
                "stream summary"
            );
        }
        tracing::info!(failed, discarded, "consumer closed");

        let hook_result = match self.on_close.take() {
            Some(hook) => hook(failed),
            None => Ok(()),
        };

        self.failure.check()?;
        hook_result.map_err(ConsumerError::Hook)
    }

    /// Per-stream counters for this run
    pub fn summary(&self) -> Vec<StreamSummary> {
        self.buffers.summary()
    }

    /// The run's fatal error, if one has occurred
    pub fn failure(&self) -> Option<Arc<FatalError>> {
        self.failure.get()
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    fn fail(&self, error: FatalError) -> ConsumerError {
        tracing::error!(error = %error, "run failed");
        ConsumerError::Fatal(self.failure.record(error))
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
