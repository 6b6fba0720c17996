// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record buffering

mod manager;
mod stream_buffer;

pub use manager::{Batch, BufferManager, StreamSummary};
pub use stream_buffer::StreamBuffer;
