// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! First-failure-wins cell shared by the consumer and its workers

use crate::error::FatalError;
use std::sync::{Arc, OnceLock};

/// Holds the first fatal error of a run. Once set it never changes.
#[derive(Debug, Clone, Default)]
pub struct FlushFailure {
    cell: Arc<OnceLock<Arc<FatalError>>>,
}

impl FlushFailure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` unless a failure is already set; returns the failure
    /// that is in effect.
    pub fn record(&self, error: FatalError) -> Arc<FatalError> {
        let error = Arc::new(error);
        let winner = self.cell.get_or_init(|| Arc::clone(&error));
        if !Arc::ptr_eq(winner, &error) {
            tracing::debug!(error = %error, first = %winner, "ignoring failure after the first");
        }
        Arc::clone(winner)
    }

    pub fn is_failed(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> Option<Arc<FatalError>> {
        self.cell.get().cloned()
    }

    /// `Err` with the recorded failure, if any
    pub fn check(&self) -> Result<(), Arc<FatalError>> {
        match self.cell.get() {
            Some(error) => Err(Arc::clone(error)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
