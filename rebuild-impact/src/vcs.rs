// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The interface at which the version-control adapter is opaque to the
//! core. Retrieving the list of incoming commits -- and their per-commit
//! changed-file lists -- from an actual git/hg checkout is outside this
//! crate's scope; this trait is the seam.

use crate::errors::VcsError;
use crate::models::CommitInfo;

/// Supplies incoming commits (and, for non-C/C++ workspaces, a tracked file
/// count) to the orchestrator.
///
/// An implementation is expected to retrieve commits present on a tracked
/// remote/upstream reference but not on the local working reference --
/// what's actually reachable from the filesystem, a `git` subprocess, or an
/// editor's own source-control API is an implementation detail the core
/// never sees.
pub trait VcsAdapter {
    /// Returns every incoming commit, oldest first.
    ///
    /// An empty list is a valid result, not an error: it yields a
    /// zero-impact report.
    fn incoming_commits(&self) -> Result<Vec<CommitInfo>, VcsError>;

    /// The total number of tracked files in the workspace, used as the
    /// denominator fallback when no C/C++ files were discovered by the
    /// dependency graph (step 6 of the pipeline).
    fn tracked_file_count(&self) -> Result<usize, VcsError>;
}

pub use test_support::StaticVcsAdapter;

mod test_support {
    use super::*;

    /// A fixed-answer [`VcsAdapter`] for tests and examples.
    ///
    /// Kept in the main crate (rather than a separate fixtures crate) since
    /// there's exactly one trait to fake; a real editor shell supplies its
    /// own adapter backed by `git`/`hg`.
    #[derive(Clone, Debug, Default)]
    pub struct StaticVcsAdapter {
        commits: Vec<CommitInfo>,
        tracked_file_count: usize,
    }

    impl StaticVcsAdapter {
        /// Creates an adapter that always returns `commits` and
        /// `tracked_file_count`.
        pub fn new(commits: Vec<CommitInfo>, tracked_file_count: usize) -> Self {
            Self {
                commits,
                tracked_file_count,
            }
        }
    }

    impl VcsAdapter for StaticVcsAdapter {
        fn incoming_commits(&self) -> Result<Vec<CommitInfo>, VcsError> {
            Ok(self.commits.clone())
        }

        fn tracked_file_count(&self) -> Result<usize, VcsError> {
            Ok(self.tracked_file_count)
        }
    }
}
