//! `sluice config` specs

use crate::prelude::*;

#[test]
fn shows_defaults_without_a_file() {
    cli()
        .args(&["config"])
        .passes()
        .stdout_has("max_memory_bytes = 1073741824")
        .stdout_has("idle_wait = \"25ms\"")
        .stdout_lacks("default_namespace");
}

#[test]
fn file_overrides_defaults() {
    let temp = Project::empty();
    temp.file(
        "sluice.toml",
        "worker_count = 2\ncommit_mode = \"two-phase\"\nmax_time_between_flushes = \"5s\"\n",
    );

    temp.sluice()
        .args(&["config", "--config", "sluice.toml"])
        .passes()
        .stdout_has("worker_count = 2")
        .stdout_has("commit_mode = \"two-phase\"")
        .stdout_has("max_time_between_flushes = \"5s\"");
}

#[test]
fn unknown_key_is_rejected() {
    let temp = Project::empty();
    temp.file("sluice.toml", "workers = 2\n");

    temp.sluice()
        .args(&["config", "--config", "sluice.toml"])
        .fails()
        .stderr_has("workers");
}

#[test]
fn zero_workers_is_rejected() {
    let temp = Project::empty();
    temp.file("sluice.toml", "worker_count = 0\n");

    temp.sluice()
        .args(&["config", "--config", "sluice.toml"])
        .fails()
        .stderr_has("worker_count");
}

#[test]
fn missing_file_is_reported() {
    let temp = Project::empty();

    temp.sluice()
        .args(&["config", "--config", "nope.toml"])
        .fails()
        .stderr_has("nope.toml");
}
