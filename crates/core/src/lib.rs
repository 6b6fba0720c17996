// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sluice-core: buffering and checkpoint bookkeeping for a sync destination
//!
//! This crate provides:
//! - Stream identities, the configured catalog, and the message decoder
//! - The global memory quota and per-stream record buffers
//! - The checkpoint lifecycle (pending, flushed, committed)
//! - Engine configuration

pub mod clock;

pub mod buffer;
pub mod checkpoint;
pub mod config;
pub mod decode;
pub mod memory;
pub mod message;
pub mod stream;

pub use buffer::{Batch, BufferManager, StreamBuffer, StreamSummary};
pub use checkpoint::{
    CheckpointManager, CommitMode, CommittedCheckpoint, ScopeConflictError, ScopeKey, ScopeMode,
    Watermark,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use decode::{decode, DecodeError};
pub use memory::{GlobalMemoryManager, MemoryGrant, BLOCK_SIZE_BYTES};
pub use message::{CheckpointMessage, CheckpointScope, DecodedMessage, RecordMessage};
pub use stream::{Catalog, CatalogError, StreamIdentity, ValidationError};
