// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global memory quota shared by every stream buffer
//!
//! Quota is handed out in fixed-size blocks through a single atomic
//! counter. Requests never block: an exhausted quota grants zero bytes.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Default quota block size (10 MiB)
pub const BLOCK_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Block-granular byte quota
#[derive(Debug)]
pub struct GlobalMemoryManager {
    max_bytes: i64,
    block_size: i64,
    allocated: AtomicI64,
}

impl GlobalMemoryManager {
    pub fn new(max_bytes: u64) -> Self {
        Self::with_block_size(max_bytes, BLOCK_SIZE_BYTES)
    }

    pub fn with_block_size(max_bytes: u64, block_size: u64) -> Self {
        Self {
            max_bytes: i64::try_from(max_bytes).unwrap_or(i64::MAX),
            block_size: i64::try_from(block_size).unwrap_or(i64::MAX),
            allocated: AtomicI64::new(0),
        }
    }

    /// Grant up to one block of quota.
    ///
    /// Returns the number of bytes granted, `0` when there is no headroom.
    pub fn request_block(&self) -> u64 {
        let max = self.max_bytes;
        let block = self.block_size;
        let result = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let headroom = max.saturating_sub(current);
                if headroom <= 0 {
                    None
                } else {
                    Some(current + block.min(headroom))
                }
            });

        match result {
            Ok(previous) => {
                let granted = block.min(max.saturating_sub(previous));
                tracing::trace!(granted, allocated = previous + granted, "granted memory block");
                granted as u64
            }
            Err(current) => {
                tracing::trace!(allocated = current, max, "memory quota exhausted");
                0
            }
        }
    }

    /// Return quota to the pool.
    ///
    /// Releasing more than is allocated is a caller accounting bug; it is
    /// logged and the counter is left negative rather than clamped.
    pub fn release(&self, bytes: u64) {
        if bytes == 0 {
            return;
        }
        let bytes = i64::try_from(bytes).unwrap_or(i64::MAX);
        let previous = self.allocated.fetch_sub(bytes, Ordering::AcqRel);
        let remaining = previous.saturating_sub(bytes);
        if remaining < 0 {
            tracing::warn!(
                released = bytes,
                allocated_before = previous,
                allocated_after = remaining,
                "released more memory than was allocated"
            );
        }
    }

    /// Bytes currently granted across all holders. Negative only after an
    /// over-release.
    pub fn allocated_bytes(&self) -> i64 {
        self.allocated.load(Ordering::Acquire)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes as u64
    }

    pub fn block_size(&self) -> u64 {
        self.block_size as u64
    }

    /// Quota still available to grant
    pub fn available_bytes(&self) -> u64 {
        self.max_bytes
            .saturating_sub(self.allocated_bytes())
            .clamp(0, self.max_bytes) as u64
    }
}

/// Quota held on behalf of a drained batch, returned on drop
#[derive(Debug)]
pub struct MemoryGrant {
    memory: Arc<GlobalMemoryManager>,
    bytes: u64,
}

impl MemoryGrant {
    pub(crate) fn new(memory: Arc<GlobalMemoryManager>, bytes: u64) -> Self {
        Self { memory, bytes }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for MemoryGrant {
    fn drop(&mut self) {
        self.memory.release(self.bytes);
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
