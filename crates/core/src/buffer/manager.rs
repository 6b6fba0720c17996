// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stream buffers sharing one memory quota

use super::stream_buffer::StreamBuffer;
use crate::checkpoint::{CheckpointManager, Watermark};
use crate::clock::{Clock, SystemClock};
use crate::memory::{GlobalMemoryManager, MemoryGrant};
use crate::message::{CheckpointScope, RecordMessage};
use crate::stream::StreamIdentity;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

/// Records drained from one stream for a single flush.
///
/// Holds the drained quota until dropped.
#[derive(Debug)]
pub struct Batch {
    stream: StreamIdentity,
    records: Vec<RecordMessage>,
    record_count: u64,
    size_bytes: u64,
    through: u64,
    grant: MemoryGrant,
}

impl Batch {
    pub fn stream(&self) -> &StreamIdentity {
        &self.stream
    }

    pub fn records(&self) -> &[RecordMessage] {
        &self.records
    }

    /// Records drained into this batch, even after `take_records`
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Position of the last record in this batch within its stream
    pub fn through(&self) -> u64 {
        self.through
    }

    pub fn grant_bytes(&self) -> u64 {
        self.grant.bytes()
    }

    pub fn take_records(&mut self) -> Vec<RecordMessage> {
        std::mem::take(&mut self.records)
    }
}

/// Snapshot of one stream's counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub stream: StreamIdentity,
    pub enqueued: u64,
    pub flushed: u64,
    pub buffered: usize,
    pub buffered_bytes: u64,
}

type SharedBuffer = Arc<Mutex<StreamBuffer>>;

/// Owns every stream buffer, the shared memory pool, and the checkpoint
/// tracker for one run.
pub struct BufferManager {
    memory: Arc<GlobalMemoryManager>,
    checkpoints: CheckpointManager,
    buffers: RwLock<BTreeMap<StreamIdentity, SharedBuffer>>,
    clock: Arc<dyn Clock>,
    max_time_between_flushes: Option<Duration>,
}

impl BufferManager {
    pub fn new(memory: Arc<GlobalMemoryManager>, checkpoints: CheckpointManager) -> Self {
        Self {
            memory,
            checkpoints,
            buffers: RwLock::new(BTreeMap::new()),
            clock: Arc::new(SystemClock),
            max_time_between_flushes: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make any non-empty stream eligible once it has gone this long
    /// without a flush
    pub fn with_max_time_between_flushes(mut self, max: Option<Duration>) -> Self {
        self.max_time_between_flushes = max;
        self
    }

    pub fn memory(&self) -> &Arc<GlobalMemoryManager> {
        &self.memory
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Append a record to its stream's buffer.
    ///
    /// Quota is requested block by block until the buffer's grant covers
    /// the record or the pool runs dry. The record is buffered either way.
    pub fn enqueue(&self, record: RecordMessage, size_bytes: u64) {
        let buffer = self.buffer_for(&record.stream);
        let mut buffer = lock(&buffer);

        while buffer.needs_quota(size_bytes) {
            let granted = self.memory.request_block();
            if granted == 0 {
                tracing::trace!(
                    stream = %buffer.stream(),
                    used = buffer.used_bytes(),
                    granted = buffer.granted_bytes(),
                    "memory pool exhausted, buffering over quota"
                );
                break;
            }
            buffer.grant(granted);
        }
        buffer.push(record, size_bytes);
    }

    /// Pick the stream a worker should flush next.
    ///
    /// A stream is eligible when it is non-empty, has no batch in flight,
    /// and its buffered bytes exceed `threshold_bytes` (or `closing` is set,
    /// or it is overdue for a timed flush). The largest eligible stream
    /// wins; ties go to the smaller identity.
    pub fn select_stream_to_flush(
        &self,
        threshold_bytes: u64,
        closing: bool,
    ) -> Option<StreamIdentity> {
        let now = self.clock.now();
        let buffers = self.read();
        let mut best: Option<(u64, &StreamIdentity)> = None;

        for (stream, buffer) in buffers.iter() {
            let buffer = lock(buffer);
            if buffer.is_empty() || buffer.is_in_flight() {
                continue;
            }
            let used = buffer.used_bytes();
            let overdue = self
                .max_time_between_flushes
                .is_some_and(|max| now.saturating_duration_since(buffer.last_flush()) >= max);
            if !(closing || used > threshold_bytes || overdue) {
                continue;
            }
            if best.map_or(true, |(size, _)| used > size) {
                best = Some((used, stream));
            }
        }

        best.map(|(_, stream)| stream.clone())
    }

    /// Remove everything buffered for `stream`
    pub fn drain(&self, stream: &StreamIdentity) -> Option<Batch> {
        self.drain_up_to(stream, None)
    }

    /// Remove records from the front of `stream`'s buffer, up to
    /// `max_bytes` when given.
    ///
    /// Returns `None` when the stream is unknown, empty, or already has a
    /// batch in flight. The batch is in flight until passed to `complete`.
    pub fn drain_up_to(&self, stream: &StreamIdentity, max_bytes: Option<u64>) -> Option<Batch> {
        let buffer = self.get(stream)?;
        let mut buffer = lock(&buffer);
        if buffer.is_empty() || buffer.is_in_flight() {
            return None;
        }

        let taken = buffer.take(max_bytes);
        buffer.mark_in_flight();
        tracing::debug!(
            stream = %stream,
            records = taken.records.len(),
            bytes = taken.bytes,
            remaining = buffer.len(),
            "drained batch"
        );

        Some(Batch {
            stream: stream.clone(),
            record_count: taken.records.len() as u64,
            records: taken.records,
            size_bytes: taken.bytes,
            through: taken.through,
            grant: MemoryGrant::new(Arc::clone(&self.memory), taken.release),
        })
    }

    /// Finish a drained batch, returning its quota to the pool.
    ///
    /// On success the stream's flushed position advances and any checkpoint
    /// markers it covers are promoted. Returns the number promoted.
    pub fn complete(&self, batch: Batch, flushed: bool) -> usize {
        if let Some(buffer) = self.get(&batch.stream) {
            let outcome = flushed.then(|| (batch.record_count, self.clock.now()));
            lock(&buffer).finish_flight(outcome);
        }

        let promoted = if flushed {
            self.checkpoints.record_flush(&batch.stream, batch.through)
        } else {
            0
        };
        drop(batch);
        promoted
    }

    /// Records enqueued so far on the streams a marker of `scope` covers
    pub fn watermark_for(&self, scope: &CheckpointScope) -> Watermark {
        match scope.stream() {
            Some(stream) => {
                let enqueued = self.get(stream).map_or(0, |b| lock(&b).enqueued_count());
                [(stream.clone(), enqueued)].into_iter().collect()
            }
            None => self
                .read()
                .iter()
                .map(|(stream, buffer)| (stream.clone(), lock(buffer).enqueued_count()))
                .collect(),
        }
    }

    /// No records buffered and no batch in flight
    pub fn is_drained(&self) -> bool {
        self.read().values().all(|buffer| {
            let buffer = lock(buffer);
            buffer.is_empty() && !buffer.is_in_flight()
        })
    }

    /// Estimated bytes buffered across all streams
    pub fn buffered_bytes(&self) -> u64 {
        self.read()
            .values()
            .fold(0, |total: u64, b| total.saturating_add(lock(b).used_bytes()))
    }

    pub fn summary(&self) -> Vec<StreamSummary> {
        self.read()
            .values()
            .map(|buffer| {
                let buffer = lock(buffer);
                StreamSummary {
                    stream: buffer.stream().clone(),
                    enqueued: buffer.enqueued_count(),
                    flushed: buffer.flushed_count(),
                    buffered: buffer.len(),
                    buffered_bytes: buffer.used_bytes(),
                }
            })
            .collect()
    }

    /// Discard anything still buffered and return all held quota.
    ///
    /// Returns the number of records discarded.
    pub fn close(&self) -> usize {
        let mut discarded = 0;
        for buffer in self.read().values() {
            let mut buffer = lock(buffer);
            let (records, held) = buffer.discard();
            if records > 0 {
                tracing::warn!(
                    stream = %buffer.stream(),
                    records,
                    "discarding records that were never flushed"
                );
            }
            self.memory.release(held);
            discarded += records;
        }
        discarded
    }

    fn buffer_for(&self, stream: &StreamIdentity) -> SharedBuffer {
        if let Some(buffer) = self.get(stream) {
            return buffer;
        }
        let mut buffers = self.buffers.write().unwrap_or_else(|e| e.into_inner());
        let buffer = buffers.entry(stream.clone()).or_insert_with(|| {
            tracing::debug!(stream = %stream, "created stream buffer");
            Arc::new(Mutex::new(StreamBuffer::new(
                stream.clone(),
                self.clock.now(),
            )))
        });
        Arc::clone(buffer)
    }

    fn get(&self, stream: &StreamIdentity) -> Option<SharedBuffer> {
        self.read().get(stream).cloned()
    }

    fn read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, BTreeMap<StreamIdentity, SharedBuffer>> {
        self.buffers.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferManager")
            .field("memory", &self.memory)
            .field("checkpoints", &self.checkpoints)
            .field("streams", &self.read().len())
            .field("max_time_between_flushes", &self.max_time_between_flushes)
            .finish()
    }
}

fn lock(buffer: &Mutex<StreamBuffer>) -> MutexGuard<'_, StreamBuffer> {
    buffer.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
