// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sluice_core::{StreamIdentity, ValidationError};

fn unrecognized(name: &str) -> FatalError {
    FatalError::Validation(ValidationError::UnrecognizedStream(StreamIdentity::named(
        name,
    )))
}

#[test]
fn starts_unset() {
    let failure = FlushFailure::new();
    assert!(!failure.is_failed());
    assert!(failure.get().is_none());
    assert!(failure.check().is_ok());
}

#[test]
fn first_failure_wins() {
    let failure = FlushFailure::new();
    let first = failure.record(unrecognized("first"));
    let second = failure.record(unrecognized("second"));

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.to_string().contains("first"));
    assert!(Arc::ptr_eq(&failure.check().unwrap_err(), &first));
}

#[test]
fn clones_share_the_cell() {
    let failure = FlushFailure::new();
    let worker_view = failure.clone();

    worker_view.record(FatalError::Worker("panicked".to_string()));
    assert!(failure.is_failed());
}

#[test]
fn concurrent_records_agree_on_one_winner() {
    let failure = FlushFailure::new();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let failure = failure.clone();
            std::thread::spawn(move || failure.record(unrecognized(&i.to_string())))
        })
        .collect();

    let winners: Vec<Arc<FatalError>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(winners.iter().all(|w| Arc::ptr_eq(w, &winners[0])));
}
