//! Failure specs for `sluice run`

use crate::prelude::*;

fn run(temp: &Project, lines: &[String]) -> RunAssert {
    temp.sluice()
        .args(&["run", "--catalog", "catalog.json", "--output", "out"])
        .stdin(lines)
        .fails()
}

#[test]
fn unknown_stream_fails_without_emitting_its_state() {
    let temp = Project::with_catalog();
    run(
        &temp,
        &[record("users", 1), record("payments", 1), global_state(1)],
    )
    .stderr_has("public.payments")
    .stdout_lacks("STATE");
}

#[test]
fn mixing_scopes_fails() {
    let temp = Project::with_catalog();
    run(
        &temp,
        &[
            record("users", 1),
            stream_state("users", 1),
            record("users", 2),
            global_state(2),
        ],
    )
    .stderr_has("connection-wide checkpoint received after per-stream");
}

#[test]
fn state_without_body_is_rejected() {
    let temp = Project::with_catalog();
    run(&temp, &[r#"{"type":"STATE"}"#.to_string()]).stderr_has("STATE message without state");
}

#[test]
fn invalid_catalog_is_reported() {
    let temp = Project::empty();
    temp.file("catalog.json", "{\"streams\": 3}");

    run(&temp, &[]).stderr_has("invalid catalog");
}
