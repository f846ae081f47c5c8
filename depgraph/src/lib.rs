// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scans a C/C++ workspace and tracks the reverse `#include` dependency
//! graph, the denominator implied by Visual Studio solution/project files,
//! and the logical modules files belong to.
//!
//! This crate is the low-level engine consumed by `rebuild-impact`'s
//! orchestrator: it knows nothing about commits, version control, or
//! configuration storage, only about files, includes, and builds.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use depgraph::graph::{BuildOptions, DependencyGraph};
//!
//! let mut graph = DependencyGraph::new("/path/to/workspace");
//! graph.build(&BuildOptions::default()).unwrap();
//!
//! let affected = graph.affected(&[Utf8PathBuf::from("src/widget.h")]);
//! let pct = depgraph::estimator::percentage(affected.len(), graph.total_files());
//! println!("{:.1}% of the project would rebuild", pct);
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod errors;
pub mod estimator;
pub mod graph;
pub mod include_parse;
pub mod modules;
pub mod paths;
pub mod projectfile;
pub mod scan;

pub use errors::Error;
pub use graph::{BuildOptions, DependencyGraph};
