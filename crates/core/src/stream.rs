// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream identity and the catalog of streams declared for a run

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Identity of one logical stream: an optional namespace plus a name.
///
/// An absent namespace is distinct from an empty one. Ordering is namespace
/// first (absent sorts first), then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamIdentity {
    pub namespace: Option<String>,
    pub name: String,
}

impl StreamIdentity {
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// A stream without a namespace
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(None, name)
    }

    /// A stream within a namespace
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Some(namespace.into()), name)
    }

    /// Fill in `default` when the namespace is absent
    pub fn with_default_namespace(self, default: Option<&str>) -> Self {
        match (self.namespace, default) {
            (None, Some(ns)) => Self::new(Some(ns.to_string()), self.name),
            (namespace, _) => Self::new(namespace, self.name),
        }
    }
}

impl fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record for stream {0} which is not in the configured catalog")]
    UnrecognizedStream(StreamIdentity),
}

/// The set of streams a run is allowed to receive records for
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    streams: BTreeSet<StreamIdentity>,
}

impl Catalog {
    pub fn new(streams: impl IntoIterator<Item = StreamIdentity>) -> Self {
        Self {
            streams: streams.into_iter().collect(),
        }
    }

    /// Parse a configured catalog document.
    ///
    /// Only the stream descriptors are read:
    /// `{"streams":[{"stream":{"name":"users","namespace":"public"}}]}`
    pub fn from_configured_catalog_json(json: &str) -> Result<Self, CatalogError> {
        let doc: ConfiguredCatalog = serde_json::from_str(json)?;
        Ok(Self::new(doc.streams.into_iter().map(|s| {
            StreamIdentity::new(s.stream.namespace, s.stream.name)
        })))
    }

    pub fn contains(&self, stream: &StreamIdentity) -> bool {
        self.streams.contains(stream)
    }

    pub fn validate(&self, stream: &StreamIdentity) -> Result<(), ValidationError> {
        if self.contains(stream) {
            Ok(())
        } else {
            Err(ValidationError::UnrecognizedStream(stream.clone()))
        }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamIdentity> {
        self.streams.iter()
    }
}

#[derive(Deserialize)]
struct ConfiguredCatalog {
    streams: Vec<ConfiguredStream>,
}

#[derive(Deserialize)]
struct ConfiguredStream {
    stream: StreamDescriptor,
}

#[derive(Deserialize)]
struct StreamDescriptor {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
