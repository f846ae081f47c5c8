// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types surfaced by the orchestrator.
//!
//! Most failure modes described in the design (transient I/O, a malformed
//! project file, a corrupt or mismatched cache) are swallowed internally and
//! never reach this type -- the analysis degrades gracefully instead. What's
//! left here is what the design calls out as surfaced: version-control
//! adapter failures, a fatal dependency-graph build failure (e.g. the
//! directory-count safety cap), and an analysis already in progress.

use std::{error, fmt};

/// Error type returned by [`crate::analyzer::ChangeAnalyzer::run`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Another analysis is already in progress; this one was rejected.
    AnalysisInProgress,
    /// The version-control adapter failed to enumerate incoming commits or
    /// the tracked file count.
    Vcs(VcsError),
    /// The dependency graph failed to build (e.g. the directory-count safety
    /// cap was exceeded). Unlike per-file scan/parse failures, this is fatal
    /// and must be propagated rather than swallowed.
    Graph(depgraph::errors::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AnalysisInProgress => {
                write!(f, "an analysis is already in progress")
            }
            Error::Vcs(err) => write!(f, "version-control adapter error: {}", err),
            Error::Graph(err) => write!(f, "dependency graph build failed: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::AnalysisInProgress => None,
            Error::Vcs(err) => Some(err),
            Error::Graph(err) => Some(err),
        }
    }
}

impl From<VcsError> for Error {
    fn from(err: VcsError) -> Self {
        Error::Vcs(err)
    }
}

impl From<depgraph::errors::Error> for Error {
    fn from(err: depgraph::errors::Error) -> Self {
        Error::Graph(err)
    }
}

/// An error surfaced by a [`crate::vcs::VcsAdapter`] implementation.
///
/// The core demands a valid list of commits to proceed; an empty list is a
/// valid input yielding a zero-impact report, but a failure to even retrieve
/// that list (missing tracking branch, fetch failure, ...) is surfaced here
/// for the editor shell to act on -- prompting the user is not this crate's
/// responsibility.
#[derive(Debug)]
#[non_exhaustive]
pub enum VcsError {
    /// No tracking branch/upstream reference is configured.
    NoTrackingBranch,
    /// Fetching from the remote failed.
    FetchFailed(String),
    /// Commit enumeration failed for some other reason.
    Other(String),
}

impl fmt::Display for VcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsError::NoTrackingBranch => write!(f, "no tracking branch configured"),
            VcsError::FetchFailed(msg) => write!(f, "fetch failed: {}", msg),
            VcsError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl error::Error for VcsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn graph_error_converts_via_from_and_chains_source() {
        let graph_err = depgraph::errors::Error::DirectoryCapExceeded { cap: 500_000 };
        let err: Error = graph_err.into();
        assert!(matches!(err, Error::Graph(_)));
        assert!(err.to_string().contains("dependency graph build failed"));
        assert!(err.source().is_some());
    }
}
