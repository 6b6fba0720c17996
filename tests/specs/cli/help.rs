//! Help and version output specs

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("config");
}

#[test]
fn run_help_lists_flags() {
    cli()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--catalog")
        .stdout_has("--output")
        .stdout_has("--batch-size");
}

#[test]
fn version_prints_crate_version() {
    cli()
        .args(&["--version"])
        .passes()
        .stdout_has(env!("CARGO_PKG_VERSION"));
}
