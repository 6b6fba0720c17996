// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partial message decoder
//!
//! Reads the top-level `type` discriminator and only the routing fields of
//! the matching body. Record `data` is sliced out as raw JSON text and
//! never parsed into a tree.

use crate::message::{CheckpointMessage, CheckpointScope, DecodedMessage, RecordMessage};
use crate::stream::StreamIdentity;
use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("unsupported message type: {0}")]
    UnsupportedType(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(borrow, default)]
    record: Option<&'a RawValue>,
    #[serde(borrow, default)]
    state: Option<&'a RawValue>,
}

#[derive(Deserialize)]
struct RawRecord<'a> {
    stream: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    emitted_at: Option<i64>,
    #[serde(borrow)]
    data: &'a RawValue,
}

#[derive(Deserialize)]
struct RawState {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    stream: Option<RawStreamState>,
}

#[derive(Deserialize)]
struct RawStreamState {
    stream_descriptor: RawDescriptor,
}

#[derive(Deserialize)]
struct RawDescriptor {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// Decode one serialized message.
pub fn decode(text: &str) -> Result<DecodedMessage, DecodeError> {
    let envelope: Envelope<'_> = serde_json::from_str(text)?;
    let kind = envelope
        .kind
        .ok_or_else(|| DecodeError::Malformed("missing message type".to_string()))?;

    match kind.as_str() {
        "RECORD" => {
            let body = envelope
                .record
                .ok_or_else(|| DecodeError::Malformed("RECORD message without record".to_string()))?;
            decode_record(body)
        }
        "STATE" => {
            let body = envelope
                .state
                .ok_or_else(|| DecodeError::Malformed("STATE message without state".to_string()))?;
            decode_state(body, text)
        }
        _ => Err(DecodeError::UnsupportedType(kind)),
    }
}

fn decode_record(body: &RawValue) -> Result<DecodedMessage, DecodeError> {
    let record: RawRecord<'_> = serde_json::from_str(body.get())?;
    Ok(DecodedMessage::Record(RecordMessage {
        stream: StreamIdentity::new(record.namespace, record.stream),
        emitted_at_millis: record.emitted_at.unwrap_or(0),
        payload: record.data.get().to_string(),
    }))
}

fn decode_state(body: &RawValue, text: &str) -> Result<DecodedMessage, DecodeError> {
    let state: RawState = serde_json::from_str(body.get())?;
    let scope = match state.kind.as_deref() {
        None | Some("LEGACY") => CheckpointScope::Legacy,
        Some("GLOBAL") => CheckpointScope::Global,
        Some("STREAM") => {
            let stream = state.stream.ok_or_else(|| {
                DecodeError::Malformed("STREAM state without stream descriptor".to_string())
            })?;
            let descriptor = stream.stream_descriptor;
            CheckpointScope::Stream(StreamIdentity::new(descriptor.namespace, descriptor.name))
        }
        Some(other) => return Err(DecodeError::UnsupportedType(format!("STATE/{}", other))),
    };
    Ok(DecodedMessage::Checkpoint(CheckpointMessage {
        scope,
        serialized_state: text.to_string(),
    }))
}

#[cfg(test)]
#[path = "decode_tests.rs"]
mod tests;
