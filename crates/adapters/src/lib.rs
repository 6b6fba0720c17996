// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Destination adapters for flushed batches

pub mod flush;
pub mod traced;

pub use flush::{FlushError, FlushFunction, JsonlFlush, DEFAULT_QUEUE_FLUSH_THRESHOLD_BYTES};
pub use traced::TracedFlush;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use flush::{FakeFlush, FlushCall};
