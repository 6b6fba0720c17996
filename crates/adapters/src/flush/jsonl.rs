// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines file destination
//!
//! Appends each stream's records to `<dir>/<namespace>.<name>.jsonl`
//! (`<dir>/<name>.jsonl` without a namespace, with `.`, `%` and path
//! separators percent-escaped), one
//! `{"emitted_at":..,"data":..}` object per line.

use super::{FlushError, FlushFunction};
use async_trait::async_trait;
use sluice_core::{RecordMessage, StreamIdentity};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Default preferred batch size (25 MiB)
pub const DEFAULT_OPTIMAL_BATCH_SIZE_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct JsonlFlush {
    dir: PathBuf,
    optimal_batch_size_bytes: u64,
}

impl JsonlFlush {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            optimal_batch_size_bytes: DEFAULT_OPTIMAL_BATCH_SIZE_BYTES,
        }
    }

    pub fn with_optimal_batch_size(mut self, bytes: u64) -> Self {
        self.optimal_batch_size_bytes = bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that `stream`'s records are appended to.
    ///
    /// Both parts are escaped so that `.` only ever separates namespace
    /// from name, and distinct streams never share a file.
    pub fn path_for(&self, stream: &StreamIdentity) -> PathBuf {
        let file_name = match &stream.namespace {
            Some(namespace) => format!("{}.{}", escape(namespace), escape(&stream.name)),
            None => escape(&stream.name),
        };
        self.dir.join(format!("{}.jsonl", file_name))
    }
}

fn escape(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '.' => escaped.push_str("%2E"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl FlushFunction for JsonlFlush {
    async fn flush(
        &self,
        stream: &StreamIdentity,
        records: Vec<RecordMessage>,
    ) -> Result<(), FlushError> {
        let io_err = |source| FlushError::Io {
            stream: stream.clone(),
            source,
        };

        let mut lines = String::new();
        for record in &records {
            lines.push_str(&format!(
                r#"{{"emitted_at":{},"data":{}}}"#,
                record.emitted_at_millis, record.payload
            ));
            lines.push('\n');
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(stream))
            .await
            .map_err(io_err)?;
        file.write_all(lines.as_bytes()).await.map_err(io_err)?;
        file.sync_data().await.map_err(io_err)?;
        Ok(())
    }

    fn optimal_batch_size_bytes(&self) -> u64 {
        self.optimal_batch_size_bytes
    }
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
