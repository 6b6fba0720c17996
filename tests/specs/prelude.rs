//! Shared helpers for the behavioral specs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

pub const CATALOG: &str = r#"{"streams":[
    {"stream":{"name":"users","namespace":"public"}},
    {"stream":{"name":"orders","namespace":"public"}}
]}"#;

/// A scratch directory the CLI runs in
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A project with `catalog.json` already written
    pub fn with_catalog() -> Self {
        let project = Self::empty();
        project.file("catalog.json", CATALOG);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap_or_default()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    pub fn sluice(&self) -> CliBuilder {
        CliBuilder::new(self.dir.path())
    }
}

pub fn cli() -> CliBuilder {
    CliBuilder::new(&std::env::temp_dir())
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
    stdin: Option<String>,
}

impl CliBuilder {
    fn new(dir: &Path) -> Self {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin("sluice"));
        cmd.current_dir(dir).env("RUST_LOG", "warn");
        Self { cmd, stdin: None }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn stdin(mut self, lines: &[String]) -> Self {
        let mut text = lines.join("\n");
        text.push('\n');
        self.stdin = Some(text);
        self
    }

    fn output(mut self) -> Output {
        if let Some(stdin) = self.stdin.take() {
            self.cmd.write_stdin(stdin);
        }
        self.cmd.output().unwrap()
    }

    /// Run and require exit code 0
    pub fn passes(self) -> RunAssert {
        let output = self.output();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstderr:\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and require a non-zero exit code
    pub fn fails(self) -> RunAssert {
        let output = self.output();
        assert!(
            !output.status.success(),
            "expected failure\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout missing {:?}:\n{}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout unexpectedly has {:?}:\n{}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr missing {:?}:\n{}",
            expected,
            stderr
        );
        self
    }

    /// Each non-empty stdout line parsed as JSON
    pub fn checkpoints(&self) -> Vec<serde_json::Value> {
        self.stdout()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

pub fn record(stream: &str, id: u64) -> String {
    format!(
        r#"{{"type":"RECORD","record":{{"namespace":"public","stream":"{}","emitted_at":1700000000000,"data":{{"id":{}}}}}}}"#,
        stream, id
    )
}

pub fn stream_state(stream: &str, cursor: u64) -> String {
    format!(
        r#"{{"type":"STATE","state":{{"type":"STREAM","stream":{{"stream_descriptor":{{"name":"{}","namespace":"public"}},"stream_state":{{"cursor":{}}}}}}}}}"#,
        stream, cursor
    )
}

pub fn global_state(cursor: u64) -> String {
    format!(
        r#"{{"type":"STATE","state":{{"type":"GLOBAL","global":{{"shared_state":{{"cursor":{}}}}}}}}}"#,
        cursor
    )
}

pub fn legacy_state(cursor: u64) -> String {
    format!(r#"{{"type":"STATE","state":{{"data":{{"cursor":{}}}}}}}"#, cursor)
}
