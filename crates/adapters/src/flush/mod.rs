// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination write functions

mod jsonl;

pub use jsonl::JsonlFlush;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFlush, FlushCall};

use async_trait::async_trait;
use sluice_core::{RecordMessage, StreamIdentity};
use thiserror::Error;

/// Floor for the buffered size at which a stream becomes eligible to flush (10 MiB)
pub const DEFAULT_QUEUE_FLUSH_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// Errors from flush operations
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("write to {stream} failed: {source}")]
    Io {
        stream: StreamIdentity,
        #[source]
        source: std::io::Error,
    },
    #[error("destination rejected batch for {stream}: {reason}")]
    Rejected {
        stream: StreamIdentity,
        reason: String,
    },
}

/// Writes a batch of one stream's records to the destination.
///
/// The engine never retries a failed flush; retry policy belongs to the
/// implementation.
#[async_trait]
pub trait FlushFunction: Clone + Send + Sync + 'static {
    /// Durably write `records`, in order
    async fn flush(
        &self,
        stream: &StreamIdentity,
        records: Vec<RecordMessage>,
    ) -> Result<(), FlushError>;

    /// Preferred batch size; drains are capped at this many bytes
    fn optimal_batch_size_bytes(&self) -> u64;

    /// Buffered bytes above which a stream becomes eligible to flush
    fn queue_flush_threshold_bytes(&self) -> u64 {
        DEFAULT_QUEUE_FLUSH_THRESHOLD_BYTES.max(self.optimal_batch_size_bytes())
    }
}
