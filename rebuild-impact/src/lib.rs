// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Estimates the fraction of a C/C++ workspace's translation units that
//! would need to recompile given a set of incoming commits.
//!
//! This crate is the orchestrator: it sequences [`depgraph`]'s scanning,
//! include-resolution, and module-detection machinery against a caller's
//! [`vcs::VcsAdapter`] implementation and hands back a single
//! [`models::ImpactReport`]. It does not itself talk to any version-control
//! system, editor, or configuration store -- those are external
//! collaborators specified only at the interfaces below.
//!
//! # Examples
//!
//! ```
//! use rebuild_impact::analyzer::{ChangeAnalyzer, NoCacheStore};
//! use rebuild_impact::config::Config;
//! use rebuild_impact::models::{CommitInfo, FileChange, FileChangeKind};
//! use rebuild_impact::vcs::StaticVcsAdapter;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("a.cpp"), "int main() {}").unwrap();
//!
//! let commit = CommitInfo::new(
//!     "0123456789abcdef",
//!     "touch a.cpp",
//!     "dev",
//!     "2026-01-01T00:00:00Z",
//!     vec![FileChange { path: "a.cpp".into(), kind: FileChangeKind::Modified }],
//! );
//! let vcs = StaticVcsAdapter::new(vec![commit], 0);
//! let root = camino::Utf8Path::from_path(dir.path()).unwrap();
//! let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
//! let report = analyzer.run().unwrap();
//! assert_eq!(report.global_impact_pct, 100.0);
//! ```

#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod errors;
pub mod models;
pub mod vcs;

pub use errors::Error;
pub use models::ImpactReport;
