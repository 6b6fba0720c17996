// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced flush wrapper for consistent observability

use crate::flush::{FlushError, FlushFunction};
use async_trait::async_trait;
use sluice_core::{RecordMessage, StreamIdentity};
use tracing::Instrument;

/// Wrapper that adds tracing to any FlushFunction
#[derive(Debug, Clone)]
pub struct TracedFlush<F> {
    inner: F,
}

impl<F> TracedFlush<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: FlushFunction> FlushFunction for TracedFlush<F> {
    async fn flush(
        &self,
        stream: &StreamIdentity,
        records: Vec<RecordMessage>,
    ) -> Result<(), FlushError> {
        let span = tracing::info_span!("flush", stream = %stream, records = records.len());

        async move {
            let bytes: usize = records.iter().map(|r| r.payload.len()).sum();
            tracing::debug!(bytes, "starting");

            let start = std::time::Instant::now();
            let result = self.inner.flush(stream, records).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "flushed"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "flush failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn optimal_batch_size_bytes(&self) -> u64 {
        self.inner.optimal_batch_size_bytes()
    }

    fn queue_flush_threshold_bytes(&self) -> u64 {
        self.inner.queue_flush_threshold_bytes()
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
