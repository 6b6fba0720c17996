// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const USERS_CATALOG: &str = r#"{"streams":[
    {"stream":{"name":"users","namespace":"public"}},
    {"stream":{"name":"orders","namespace":"public"}}
]}"#;

/// A temp directory holding a catalog and an output directory.
pub struct SyncEnv {
    pub temp: TempDir,
}

impl SyncEnv {
    pub fn new(catalog: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp.path().join("catalog.json"), catalog).expect("Failed to write catalog");
        Self { temp }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp.path().join("out")
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// `sluice run` against this env's catalog and output directory
    pub fn run(&self) -> Command {
        let mut cmd = Command::cargo_bin("sluice").unwrap();
        cmd.current_dir(self.path())
            .env("RUST_LOG", "warn")
            .args(["run", "--catalog", "catalog.json", "--output", "out"]);
        cmd
    }

    /// Lines written for one stream, or none if it was never flushed
    pub fn output_lines(&self, file_name: &str) -> Vec<String> {
        match fs::read_to_string(self.output_dir().join(file_name)) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn record(namespace: &str, stream: &str, data: &str) -> String {
    format!(
        r#"{{"type":"RECORD","record":{{"namespace":"{}","stream":"{}","emitted_at":1,"data":{}}}}}"#,
        namespace, stream, data
    )
}

pub fn stream_state(namespace: &str, stream: &str, cursor: u64) -> String {
    format!(
        r#"{{"type":"STATE","state":{{"type":"STREAM","stream":{{"stream_descriptor":{{"name":"{}","namespace":"{}"}},"stream_state":{{"cursor":{}}}}}}}}}"#,
        stream, namespace, cursor
    )
}

pub fn global_state(cursor: u64) -> String {
    format!(
        r#"{{"type":"STATE","state":{{"type":"GLOBAL","global":{{"shared_state":{{"cursor":{}}}}}}}}}"#,
        cursor
    )
}

/// Join message lines into a stdin payload
pub fn stdin(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Parse each stdout line as JSON
pub fn checkpoints(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("checkpoint line is JSON"))
        .collect()
}
