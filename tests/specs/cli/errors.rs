//! Argument error specs

use crate::prelude::*;

#[test]
fn no_subcommand_fails() {
    cli().args(&[]).fails().stderr_has("Usage");
}

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["flush"]).fails().stderr_has("unrecognized subcommand");
}

#[test]
fn run_requires_catalog() {
    cli()
        .args(&["run", "--output", "out"])
        .fails()
        .stderr_has("--catalog");
}
