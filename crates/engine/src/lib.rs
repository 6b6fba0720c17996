// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Sluice execution engine: flush workers and the stream consumer

mod consumer;
mod emit;
mod error;
mod failure;
mod workers;

pub use consumer::{OnClose, OnStart, StreamConsumer};
pub use emit::{CheckpointEmitter, CheckpointSink};
pub use error::{ConsumerError, FatalError, HookError};
pub use failure::FlushFailure;
pub use workers::{FlushWorkerPool, PoolDeps};
