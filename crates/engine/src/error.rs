// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the stream consumer

use sluice_adapters::FlushError;
use sluice_core::{DecodeError, ScopeConflictError, ValidationError};
use std::sync::Arc;
use thiserror::Error;

/// Errors supplied by start and close hooks
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// An error that ends the run
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("flush failed: {0}")]
    Flush(#[from] FlushError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ScopeConflict(#[from] ScopeConflictError),
    #[error("flush worker terminated abnormally: {0}")]
    Worker(String),
}

/// Errors returned by the consumer lifecycle calls
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("consumer already started")]
    AlreadyStarted,
    #[error("consumer not started")]
    NotStarted,
    #[error("consumer already closed")]
    AlreadyClosed,
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Fatal(Arc<FatalError>),
    #[error("hook failed: {0}")]
    Hook(#[source] HookError),
}

impl From<Arc<FatalError>> for ConsumerError {
    fn from(error: Arc<FatalError>) -> Self {
        ConsumerError::Fatal(error)
    }
}

impl ConsumerError {
    /// The run-ending error, if this is one
    pub fn fatal(&self) -> Option<&Arc<FatalError>> {
        match self {
            ConsumerError::Fatal(error) => Some(error),
            _ => None,
        }
    }
}
