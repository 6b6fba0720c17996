//! Checkpoint emission specs for `sluice run`
//!
//! A checkpoint reaches stdout only after every record that preceded it
//! has been written to the output directory.

use crate::prelude::*;

fn run(temp: &Project, lines: &[String]) -> RunAssert {
    temp.sluice()
        .args(&["run", "--catalog", "catalog.json", "--output", "out"])
        .stdin(lines)
        .passes()
}

#[test]
fn stream_state_is_emitted_with_record_count() {
    let temp = Project::with_catalog();
    let result = run(
        &temp,
        &[record("users", 1), record("users", 2), stream_state("users", 2)],
    );

    let emitted = result.checkpoints();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["type"], "STATE");
    assert_eq!(emitted[0]["state"]["destinationStats"]["recordCount"], 2.0);
    assert_eq!(temp.read("out/public.users.jsonl").lines().count(), 2);
}

#[test]
fn per_stream_states_are_counted_separately() {
    let temp = Project::with_catalog();
    let result = run(
        &temp,
        &[
            record("users", 1),
            record("orders", 1),
            record("orders", 2),
            stream_state("users", 1),
            stream_state("orders", 2),
        ],
    );

    let emitted = result.checkpoints();
    assert_eq!(emitted.len(), 2);
    let count_for = |name: &str| {
        emitted
            .iter()
            .find(|c| c["state"]["stream"]["stream_descriptor"]["name"] == name)
            .map(|c| c["state"]["destinationStats"]["recordCount"].clone())
            .unwrap()
    };
    assert_eq!(count_for("users"), 1.0);
    assert_eq!(count_for("orders"), 2.0);
}

#[test]
fn legacy_state_is_treated_as_connection_wide() {
    let temp = Project::with_catalog();
    let result = run(&temp, &[record("users", 1), legacy_state(1)]);

    let emitted = result.checkpoints();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["state"]["data"]["cursor"], 1);
    assert_eq!(emitted[0]["state"]["destinationStats"]["recordCount"], 1.0);
}

#[test]
fn records_without_trailing_state_are_still_written() {
    let temp = Project::with_catalog();
    let result = run(&temp, &[record("users", 1), record("orders", 1)]);

    assert!(result.checkpoints().is_empty());
    assert!(temp.exists("out/public.users.jsonl"));
    assert!(temp.exists("out/public.orders.jsonl"));
}

#[test]
fn empty_input_emits_nothing() {
    let temp = Project::with_catalog();
    let result = run(&temp, &[]);

    assert!(result.checkpoints().is_empty());
    assert!(!temp.exists("out/public.users.jsonl"));
}

#[test]
fn small_batch_size_splits_flushes() {
    let temp = Project::with_catalog();
    let lines: Vec<String> = (1..=20)
        .map(|i| record("users", i))
        .chain(std::iter::once(global_state(20)))
        .collect();

    let result = temp
        .sluice()
        .args(&[
            "run",
            "--catalog",
            "catalog.json",
            "--output",
            "out",
            "--batch-size",
            "64",
        ])
        .stdin(&lines)
        .passes();

    let emitted = result.checkpoints();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0]["state"]["destinationStats"]["recordCount"], 20.0);

    let written = temp.read("out/public.users.jsonl");
    let ids: Vec<u64> = written
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["data"]["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (1..=20).collect::<Vec<_>>());
}
