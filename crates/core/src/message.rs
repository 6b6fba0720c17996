// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoded message types
//!
//! Record payloads stay as the raw serialized text they arrived in; only
//! the routing fields are materialized.

use crate::stream::StreamIdentity;

/// Fixed per-object overhead added to every size estimate
pub const OBJECT_OVERHEAD_BYTES: u64 = 32;

/// A record destined for one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMessage {
    pub stream: StreamIdentity,
    pub emitted_at_millis: i64,
    /// Untouched serialized `data` payload
    pub payload: String,
}

impl RecordMessage {
    pub fn new(stream: StreamIdentity, emitted_at_millis: i64, payload: impl Into<String>) -> Self {
        Self {
            stream,
            emitted_at_millis,
            payload: payload.into(),
        }
    }

    /// Approximate in-memory footprint. Never underestimates the payload.
    pub fn estimated_size(&self) -> u64 {
        self.payload.len() as u64 + OBJECT_OVERHEAD_BYTES
    }
}

/// What a checkpoint marker describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointScope {
    /// One marker for the whole connection
    Global,
    /// No declared scope; treated as connection-wide
    Legacy,
    /// One marker for exactly one stream
    Stream(StreamIdentity),
}

impl CheckpointScope {
    /// Whether this scope describes the entire connection
    pub fn is_connection_wide(&self) -> bool {
        matches!(self, CheckpointScope::Global | CheckpointScope::Legacy)
    }

    pub fn stream(&self) -> Option<&StreamIdentity> {
        match self {
            CheckpointScope::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

/// A checkpoint marker, kept as the full message text it arrived as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointMessage {
    pub scope: CheckpointScope,
    pub serialized_state: String,
}

impl CheckpointMessage {
    pub fn new(scope: CheckpointScope, serialized_state: impl Into<String>) -> Self {
        Self {
            scope,
            serialized_state: serialized_state.into(),
        }
    }

    pub fn estimated_size(&self) -> u64 {
        self.serialized_state.len() as u64 + OBJECT_OVERHEAD_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    Record(RecordMessage),
    Checkpoint(CheckpointMessage),
}

impl DecodedMessage {
    pub fn estimated_size(&self) -> u64 {
        match self {
            DecodedMessage::Record(record) => record.estimated_size(),
            DecodedMessage::Checkpoint(checkpoint) => checkpoint.estimated_size(),
        }
    }
}
