// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hands committed checkpoints to the caller's output sink

use sluice_core::{CheckpointManager, CommittedCheckpoint};
use std::sync::Mutex;

/// Receives each committed checkpoint, in commit order
pub type CheckpointSink = Box<dyn FnMut(CommittedCheckpoint) + Send>;

/// Serializes reporting so a checkpoint is never delivered after a newer
/// one for the same key.
pub struct CheckpointEmitter {
    sink: Mutex<CheckpointSink>,
}

impl CheckpointEmitter {
    pub fn new(sink: impl FnMut(CommittedCheckpoint) + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Report and clear every committed checkpoint. Returns how many were
    /// reported.
    pub fn emit_committed(&self, checkpoints: &CheckpointManager) -> usize {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let committed = checkpoints.take_committed();
        let count = committed.len();
        for checkpoint in committed {
            tracing::debug!(
                key = ?checkpoint.key,
                records = checkpoint.record_count,
                "checkpoint committed"
            );
            (sink)(checkpoint);
        }
        count
    }
}

impl std::fmt::Debug for CheckpointEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointEmitter").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "emit_tests.rs"]
mod tests;
