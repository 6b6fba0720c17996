// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint lifecycle: pending -> (flushed ->) committed
//!
//! The first marker of a run fixes its scope mode: either one
//! connection-wide key, or one key per stream. Each phase keeps at most one
//! marker per key; a newer marker overwrites the older one.
//!
//! Every pending marker carries a [`Watermark`] of how many records had been
//! enqueued for the streams it covers. It is promoted only once the flush
//! workers report those streams flushed at least that far.

use crate::message::{CheckpointMessage, CheckpointScope};
use crate::stream::StreamIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

/// How flushed data becomes committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMode {
    /// A successful flush commits covered markers directly
    #[default]
    OnePhase,
    /// Legacy: a flush only moves markers to flushed; a later step commits
    TwoPhase,
}

/// Scope mode locked in by the first marker of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    Connection,
    PerStream,
}

impl ScopeMode {
    fn of(scope: &CheckpointScope) -> Self {
        if scope.is_connection_wide() {
            ScopeMode::Connection
        } else {
            ScopeMode::PerStream
        }
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeMode::Connection => write!(f, "connection-wide"),
            ScopeMode::PerStream => write!(f, "per-stream"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{received} checkpoint received after {established} checkpoints were established for this run")]
pub struct ScopeConflictError {
    pub established: ScopeMode,
    pub received: ScopeMode,
}

/// Key under which a marker is retained
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScopeKey {
    Connection,
    Stream(StreamIdentity),
}

/// Records enqueued per stream at the moment a marker arrived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark(BTreeMap<StreamIdentity, u64>);

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stream: StreamIdentity, enqueued: u64) {
        self.0.insert(stream, enqueued);
    }

    /// Records covered across all streams
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    fn is_covered(&self, flushed_through: &BTreeMap<StreamIdentity, u64>) -> bool {
        self.0
            .iter()
            .all(|(stream, n)| flushed_through.get(stream).copied().unwrap_or(0) >= *n)
    }
}

impl FromIterator<(StreamIdentity, u64)> for Watermark {
    fn from_iter<I: IntoIterator<Item = (StreamIdentity, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A marker that is safe to report upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedCheckpoint {
    pub key: ScopeKey,
    pub message: CheckpointMessage,
    /// Records flushed since the previous committed marker for this key
    pub record_count: u64,
}

impl CommittedCheckpoint {
    /// The checkpoint message with `state.destinationStats.recordCount` set
    pub fn to_message_with_stats(&self) -> Result<String, serde_json::Error> {
        let mut message: serde_json::Value = serde_json::from_str(&self.message.serialized_state)?;
        if let Some(state) = message.get_mut("state").and_then(|s| s.as_object_mut()) {
            state.insert(
                "destinationStats".to_string(),
                serde_json::json!({ "recordCount": self.record_count as f64 }),
            );
        }
        serde_json::to_string(&message)
    }
}

#[derive(Debug, Clone)]
struct Marker {
    message: CheckpointMessage,
    watermark: Watermark,
}

trait PhaseKey: Ord + Clone {
    fn scope_key(&self) -> ScopeKey;
}

impl PhaseKey for () {
    fn scope_key(&self) -> ScopeKey {
        ScopeKey::Connection
    }
}

impl PhaseKey for StreamIdentity {
    fn scope_key(&self) -> ScopeKey {
        ScopeKey::Stream(self.clone())
    }
}

#[derive(Debug)]
struct Phases<K> {
    pending: BTreeMap<K, Marker>,
    flushed: BTreeMap<K, Marker>,
    committed: BTreeMap<K, CommittedCheckpoint>,
    /// Watermark total of the last committed marker per key
    baseline: BTreeMap<K, u64>,
}

impl<K: PhaseKey> Phases<K> {
    fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            flushed: BTreeMap::new(),
            committed: BTreeMap::new(),
            baseline: BTreeMap::new(),
        }
    }

    fn commit(&mut self, key: K, marker: Marker) {
        let total = marker.watermark.total();
        let baseline = self.baseline.insert(key.clone(), total).unwrap_or(0);
        let delta = total.saturating_sub(baseline);
        let record_count = match self.committed.remove(&key) {
            Some(unreported) => unreported.record_count + delta,
            None => delta,
        };
        self.committed.insert(
            key.clone(),
            CommittedCheckpoint {
                key: key.scope_key(),
                message: marker.message,
                record_count,
            },
        );
    }
}

/// Phase operations independent of the key type
trait PhaseOps {
    fn pending_len(&self) -> usize;
    fn flushed_len(&self) -> usize;
    fn promote_covered(
        &mut self,
        flushed_through: &BTreeMap<StreamIdentity, u64>,
        mode: CommitMode,
    ) -> usize;
    fn pending_to_committed(&mut self) -> usize;
    fn pending_to_flushed(&mut self) -> usize;
    fn flushed_to_committed(&mut self) -> usize;
    fn committed(&self) -> Vec<CommittedCheckpoint>;
    fn clear_committed(&mut self);
}

impl<K: PhaseKey> PhaseOps for Phases<K> {
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn flushed_len(&self) -> usize {
        self.flushed.len()
    }

    fn promote_covered(
        &mut self,
        flushed_through: &BTreeMap<StreamIdentity, u64>,
        mode: CommitMode,
    ) -> usize {
        let ready: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, marker)| marker.watermark.is_covered(flushed_through))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &ready {
            if let Some(marker) = self.pending.remove(key) {
                match mode {
                    CommitMode::OnePhase => self.commit(key.clone(), marker),
                    CommitMode::TwoPhase => {
                        self.flushed.insert(key.clone(), marker);
                    }
                }
            }
        }
        ready.len()
    }

    fn pending_to_committed(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let moved = pending.len();
        for (key, marker) in pending {
            self.commit(key, marker);
        }
        moved
    }

    fn pending_to_flushed(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let moved = pending.len();
        self.flushed.extend(pending);
        moved
    }

    fn flushed_to_committed(&mut self) -> usize {
        let flushed = std::mem::take(&mut self.flushed);
        let moved = flushed.len();
        for (key, marker) in flushed {
            self.commit(key, marker);
        }
        moved
    }

    fn committed(&self) -> Vec<CommittedCheckpoint> {
        self.committed.values().cloned().collect()
    }

    fn clear_committed(&mut self) {
        self.committed.clear();
    }
}

/// Scope-mode tagged phase maps, chosen by the first marker
#[derive(Debug)]
enum Tracker {
    Unset,
    Connection(Phases<()>),
    PerStream(Phases<StreamIdentity>),
}

impl Tracker {
    fn mode(&self) -> Option<ScopeMode> {
        match self {
            Tracker::Unset => None,
            Tracker::Connection(_) => Some(ScopeMode::Connection),
            Tracker::PerStream(_) => Some(ScopeMode::PerStream),
        }
    }

    fn phases(&self) -> Option<&dyn PhaseOps> {
        match self {
            Tracker::Unset => None,
            Tracker::Connection(phases) => Some(phases as &dyn PhaseOps),
            Tracker::PerStream(phases) => Some(phases as &dyn PhaseOps),
        }
    }

    fn phases_mut(&mut self) -> Option<&mut dyn PhaseOps> {
        match self {
            Tracker::Unset => None,
            Tracker::Connection(phases) => Some(phases as &mut dyn PhaseOps),
            Tracker::PerStream(phases) => Some(phases as &mut dyn PhaseOps),
        }
    }
}

#[derive(Debug)]
struct State {
    tracker: Tracker,
    /// Records durably flushed per stream, in enqueue order
    flushed_through: BTreeMap<StreamIdentity, u64>,
}

/// Tracks checkpoint markers from arrival until they are safe to report
#[derive(Debug)]
pub struct CheckpointManager {
    commit_mode: CommitMode,
    state: Mutex<State>,
}

impl CheckpointManager {
    pub fn new(commit_mode: CommitMode) -> Self {
        Self {
            commit_mode,
            state: Mutex::new(State {
                tracker: Tracker::Unset,
                flushed_through: BTreeMap::new(),
            }),
        }
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// Scope mode of this run, once the first marker has arrived
    pub fn scope_mode(&self) -> Option<ScopeMode> {
        self.lock().tracker.mode()
    }

    /// Track a new pending marker, replacing any pending marker for the
    /// same key.
    pub fn add_marker(
        &self,
        message: CheckpointMessage,
        watermark: Watermark,
    ) -> Result<(), ScopeConflictError> {
        let received = ScopeMode::of(&message.scope);
        let mut state = self.lock();

        if let Tracker::Unset = state.tracker {
            tracing::debug!(mode = %received, "checkpoint scope established");
            state.tracker = match received {
                ScopeMode::Connection => Tracker::Connection(Phases::new()),
                ScopeMode::PerStream => Tracker::PerStream(Phases::new()),
            };
        }

        let established = state.tracker.mode().unwrap_or(received);
        let stream = message.scope.stream().cloned();
        let marker = Marker {
            message,
            watermark,
        };
        match (&mut state.tracker, stream) {
            (Tracker::Connection(phases), None) => {
                phases.pending.insert((), marker);
            }
            (Tracker::PerStream(phases), Some(stream)) => {
                phases.pending.insert(stream, marker);
            }
            _ => {
                return Err(ScopeConflictError {
                    established,
                    received,
                })
            }
        }
        Ok(())
    }

    /// Record that `stream` has been durably flushed through its
    /// `through`-th enqueued record, then promote every marker that is now
    /// covered. Returns the number of markers promoted.
    pub fn record_flush(&self, stream: &StreamIdentity, through: u64) -> usize {
        let mut state = self.lock();
        let entry = state.flushed_through.entry(stream.clone()).or_insert(0);
        *entry = (*entry).max(through);
        Self::promote_locked(&mut state, self.commit_mode)
    }

    /// Promote every pending marker whose covered records are all flushed
    pub fn promote_covered(&self) -> usize {
        let mut state = self.lock();
        Self::promote_locked(&mut state, self.commit_mode)
    }

    fn promote_locked(state: &mut State, mode: CommitMode) -> usize {
        let State {
            tracker,
            flushed_through,
        } = state;
        match tracker.phases_mut() {
            Some(phases) => phases.promote_covered(flushed_through, mode),
            None => 0,
        }
    }

    /// Move every pending marker to committed
    pub fn advance_pending_to_committed(&self) -> usize {
        self.lock()
            .tracker
            .phases_mut()
            .map_or(0, |phases| phases.pending_to_committed())
    }

    /// Legacy: move every pending marker to flushed. No-op in one-phase mode.
    pub fn advance_pending_to_flushed(&self) -> usize {
        if self.commit_mode == CommitMode::OnePhase {
            return 0;
        }
        self.lock()
            .tracker
            .phases_mut()
            .map_or(0, |phases| phases.pending_to_flushed())
    }

    /// Legacy: move every flushed marker to committed. No-op in one-phase mode.
    pub fn advance_flushed_to_committed(&self) -> usize {
        if self.commit_mode == CommitMode::OnePhase {
            return 0;
        }
        self.lock()
            .tracker
            .phases_mut()
            .map_or(0, |phases| phases.flushed_to_committed())
    }

    /// Committed markers: at most one for a connection-wide run, otherwise
    /// ordered by namespace (absent first) then name.
    pub fn list_committed(&self) -> Vec<CommittedCheckpoint> {
        self.lock()
            .tracker
            .phases()
            .map_or_else(Vec::new, |phases| phases.committed())
    }

    pub fn clear_committed(&self) {
        if let Some(phases) = self.lock().tracker.phases_mut() {
            phases.clear_committed();
        }
    }

    /// List and clear committed markers under one lock
    pub fn take_committed(&self) -> Vec<CommittedCheckpoint> {
        let mut state = self.lock();
        match state.tracker.phases_mut() {
            Some(phases) => {
                let committed = phases.committed();
                phases.clear_committed();
                committed
            }
            None => Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock().tracker.phases().map_or(0, |p| p.pending_len())
    }

    pub fn flushed_count(&self) -> usize {
        self.lock().tracker.phases().map_or(0, |p| p.flushed_len())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for CheckpointManager {
    fn default() -> Self {
        Self::new(CommitMode::default())
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
