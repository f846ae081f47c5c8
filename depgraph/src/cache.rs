// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted graph snapshot, keyed by workspace root.
//!
//! The on-disk schema intentionally matches the shape published in the
//! external-interfaces section of the design: `{ rootPath, builtAt, files:
//! { [relPath]: { mtime, includes } } }`. The store itself is opaque to this
//! crate -- any key-value blob store suffices, as long as it hands back the
//! bytes produced by [`GraphCache::to_json`].

use crate::errors::Error;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single cached file entry: its last-observed mtime and the includes it
/// resolved to the last time it was parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFile {
    /// Last-observed modification time, in milliseconds since the Unix epoch.
    pub mtime: i64,
    /// The resolved include targets, in the order they appeared in the file.
    pub includes: Vec<Utf8PathBuf>,
}

/// A persisted snapshot of a [`DependencyGraph`](crate::graph::DependencyGraph).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCache {
    /// The workspace root this cache was built against. A cache loaded
    /// against a graph with a different root is discarded by the caller.
    #[serde(rename = "rootPath")]
    pub root_path: Utf8PathBuf,
    /// ISO-8601 timestamp of when this snapshot was built.
    #[serde(rename = "builtAt")]
    pub built_at: String,
    /// Every file known at the time the snapshot was taken.
    pub files: BTreeMap<Utf8PathBuf, CachedFile>,
}

impl GraphCache {
    /// Serializes this cache to its JSON wire form.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Error::CacheEncodeFailed)
    }

    /// Deserializes a cache from its JSON wire form.
    pub fn from_json(data: &str) -> Result<Self, Error> {
        serde_json::from_str(data).map_err(Error::CacheCorrupt)
    }
}
