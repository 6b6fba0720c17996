// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake flush function for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{FlushError, FlushFunction};
use async_trait::async_trait;
use sluice_core::{RecordMessage, StreamIdentity};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded flush call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushCall {
    pub stream: StreamIdentity,
    pub records: Vec<RecordMessage>,
}

/// Flush function that records every call and can be told to fail
#[derive(Debug, Clone)]
pub struct FakeFlush {
    calls: Arc<Mutex<Vec<FlushCall>>>,
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
    optimal_batch_size_bytes: u64,
    queue_flush_threshold_bytes: u64,
}

impl Default for FakeFlush {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on_call: None,
            delay: None,
            optimal_batch_size_bytes: 1024 * 1024,
            queue_flush_threshold_bytes: 0,
        }
    }
}

impl FakeFlush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th call (1-based) and every call after it
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_optimal_batch_size(mut self, bytes: u64) -> Self {
        self.optimal_batch_size_bytes = bytes;
        self
    }

    pub fn with_queue_flush_threshold(mut self, bytes: u64) -> Self {
        self.queue_flush_threshold_bytes = bytes;
        self
    }

    /// Get all recorded calls, failed ones included
    pub fn calls(&self) -> Vec<FlushCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every record handed to a call for `stream`, in call order
    pub fn records_for(&self, stream: &StreamIdentity) -> Vec<RecordMessage> {
        self.calls()
            .into_iter()
            .filter(|call| &call.stream == stream)
            .flat_map(|call| call.records)
            .collect()
    }
}

#[async_trait]
impl FlushFunction for FakeFlush {
    async fn flush(
        &self,
        stream: &StreamIdentity,
        records: Vec<RecordMessage>,
    ) -> Result<(), FlushError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            calls.push(FlushCall {
                stream: stream.clone(),
                records,
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.fail_on_call {
            Some(n) if call_number >= n => Err(FlushError::Rejected {
                stream: stream.clone(),
                reason: format!("injected failure on call {}", call_number),
            }),
            _ => Ok(()),
        }
    }

    fn optimal_batch_size_bytes(&self) -> u64 {
        self.optimal_batch_size_bytes
    }

    fn queue_flush_threshold_bytes(&self) -> u64 {
        self.queue_flush_threshold_bytes
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
