// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types returned by `depgraph`.

use camino::Utf8PathBuf;
use std::{error, fmt};

/// Error type describing the sorts of errors `depgraph` can return.
///
/// Transient I/O failures while scanning or parsing individual files are
/// swallowed internally (the offending file is skipped and the scan
/// continues) rather than surfaced here; see the crate-level docs for the
/// full error taxonomy.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A cache was loaded whose `root_path` does not match the graph's root.
    CacheRootMismatch {
        /// The root path the graph was constructed with.
        expected: Utf8PathBuf,
        /// The root path recorded in the cache blob.
        found: Utf8PathBuf,
    },
    /// The cache blob could not be deserialized.
    CacheCorrupt(serde_json::Error),
    /// The cache blob could not be serialized for persistence.
    CacheEncodeFailed(serde_json::Error),
    /// The directory scan aborted after exceeding the safety cap.
    DirectoryCapExceeded {
        /// The configured cap that was exceeded.
        cap: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CacheRootMismatch { expected, found } => write!(
                f,
                "graph cache root mismatch: expected '{}', found '{}'",
                expected, found
            ),
            Error::CacheCorrupt(err) => write!(f, "graph cache is corrupt: {}", err),
            Error::CacheEncodeFailed(err) => write!(f, "failed to encode graph cache: {}", err),
            Error::DirectoryCapExceeded { cap } => {
                write!(f, "directory scan aborted after visiting {} directories", cap)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::CacheCorrupt(err) | Error::CacheEncodeFailed(err) => Some(err),
            Error::CacheRootMismatch { .. } | Error::DirectoryCapExceeded { .. } => None,
        }
    }
}
