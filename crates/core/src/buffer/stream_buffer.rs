// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered, byte-accounted queue of records for one stream

use crate::message::RecordMessage;
use crate::stream::StreamIdentity;
use std::collections::VecDeque;
use std::time::Instant;

#[derive(Debug)]
struct BufferedRecord {
    record: RecordMessage,
    size: u64,
}

/// Records removed from the front of a buffer
#[derive(Debug)]
pub(crate) struct Taken {
    pub records: Vec<RecordMessage>,
    pub bytes: u64,
    /// Quota to hand back to the global pool
    pub release: u64,
    /// Records ever drained from this buffer, including these
    pub through: u64,
}

/// FIFO record buffer for one stream.
///
/// `used_bytes` is the estimated size of what is buffered; `granted_bytes`
/// is the quota this buffer holds from the global pool. Used may exceed
/// granted when the pool ran dry.
#[derive(Debug)]
pub struct StreamBuffer {
    stream: StreamIdentity,
    records: VecDeque<BufferedRecord>,
    used_bytes: u64,
    granted_bytes: u64,
    enqueued: u64,
    drained: u64,
    flushed: u64,
    in_flight: bool,
    last_flush: Instant,
}

impl StreamBuffer {
    pub(crate) fn new(stream: StreamIdentity, now: Instant) -> Self {
        Self {
            stream,
            records: VecDeque::new(),
            used_bytes: 0,
            granted_bytes: 0,
            enqueued: 0,
            drained: 0,
            flushed: 0,
            in_flight: false,
            last_flush: now,
        }
    }

    pub fn stream(&self) -> &StreamIdentity {
        &self.stream
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn granted_bytes(&self) -> u64 {
        self.granted_bytes
    }

    /// Records ever enqueued
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued
    }

    /// Records ever flushed successfully
    pub fn flushed_count(&self) -> u64 {
        self.flushed
    }

    /// Whether a drained batch from this buffer is still being flushed
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    pub(crate) fn needs_quota(&self, size: u64) -> bool {
        self.used_bytes.saturating_add(size) > self.granted_bytes
    }

    pub(crate) fn grant(&mut self, bytes: u64) {
        self.granted_bytes = self.granted_bytes.saturating_add(bytes);
    }

    pub(crate) fn push(&mut self, record: RecordMessage, size: u64) {
        self.used_bytes = self.used_bytes.saturating_add(size);
        self.enqueued += 1;
        self.records.push_back(BufferedRecord { record, size });
    }

    /// Remove records from the front, up to `max_bytes` when given.
    ///
    /// At least one record is taken from a non-empty buffer even if it alone
    /// exceeds `max_bytes`. Emptying the buffer hands back all held quota.
    pub(crate) fn take(&mut self, max_bytes: Option<u64>) -> Taken {
        let mut records = Vec::new();
        let mut bytes: u64 = 0;

        while let Some(front) = self.records.front() {
            if let Some(max) = max_bytes {
                if !records.is_empty() && bytes.saturating_add(front.size) > max {
                    break;
                }
            }
            let Some(item) = self.records.pop_front() else {
                break;
            };
            bytes = bytes.saturating_add(item.size);
            records.push(item.record);
        }

        self.used_bytes = self.used_bytes.saturating_sub(bytes);
        self.drained += records.len() as u64;

        let release = if self.records.is_empty() {
            self.granted_bytes
        } else {
            bytes.min(self.granted_bytes)
        };
        self.granted_bytes -= release;

        Taken {
            records,
            bytes,
            release,
            through: self.drained,
        }
    }

    pub(crate) fn mark_in_flight(&mut self) {
        self.in_flight = true;
    }

    pub(crate) fn finish_flight(&mut self, flushed: Option<(u64, Instant)>) {
        self.in_flight = false;
        if let Some((records, at)) = flushed {
            self.flushed += records;
            self.last_flush = at;
        }
    }

    /// Drop everything still buffered. Returns (records discarded, quota held).
    pub(crate) fn discard(&mut self) -> (usize, u64) {
        let discarded = self.records.len();
        self.records.clear();
        self.used_bytes = 0;
        let held = std::mem::take(&mut self.granted_bytes);
        (discarded, held)
    }
}

#[cfg(test)]
#[path = "stream_buffer_tests.rs"]
mod tests;
