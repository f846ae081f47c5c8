// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Iterative, queue-based directory scanning.
//!
//! The traversal never recurses -- workspaces can nest arbitrarily deep, and
//! the algorithm must tolerate trees deeper than any reasonable call stack.
//! Symlink cycles are broken by canonicalizing each directory before it is
//! queued and tracking a visited set of canonical paths.

use crate::errors::Error;
use crate::paths::{is_module_marker_file, is_source_or_header, normalize_relative};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

/// Directory basenames that are always skipped, regardless of configuration.
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "build",
    "out",
    "dist",
    ".vs",
    ".vscode",
    "__pycache__",
    "Debug",
    "Release",
    "x64",
    "x86",
    ".idea",
    "cmake-build-debug",
    "cmake-build-release",
    "Binaries",
    "Intermediate",
    "DerivedDataCache",
    "Saved",
];

/// Safety valve: abort the scan after visiting this many distinct
/// canonicalized directories.
pub const MAX_DIRECTORIES: usize = 500_000;

/// Options controlling which parts of the workspace are scanned.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Workspace-relative roots to scan. Empty means "scan the entire
    /// workspace".
    pub include_paths: Vec<Utf8PathBuf>,
    /// Workspace-relative paths to exclude, in addition to [`SKIP_DIRS`].
    pub exclude_paths: Vec<Utf8PathBuf>,
}

/// The result of one scan pass: every discovered source/header file,
/// workspace-relative and forward-slash normalized.
#[derive(Clone, Debug, Default)]
pub struct ScanResult {
    /// Discovered files, in discovery order.
    pub files: Vec<Utf8PathBuf>,
    /// Discovered module-declaration files (`*.Build.cs`, `CMakeLists.txt`),
    /// collected during the same walk since module detection needs them but
    /// they aren't themselves source or header files.
    pub marker_files: Vec<Utf8PathBuf>,
}

fn is_excluded(rel: &Utf8Path, exclude_paths: &[Utf8PathBuf]) -> bool {
    exclude_paths
        .iter()
        .any(|excluded| rel == excluded || rel.starts_with(excluded))
}

fn should_skip_dir(basename: &str, rel: &Utf8Path, exclude_paths: &[Utf8PathBuf]) -> bool {
    if SKIP_DIRS.contains(&basename) {
        return true;
    }
    if basename.starts_with('.') {
        return true;
    }
    is_excluded(rel, exclude_paths)
}

/// Scans `root` (or, if `options.include_paths` is non-empty, each listed
/// root relative to it) for C/C++ source and header files.
///
/// Individual `readdir`/`stat`/`realpath` failures are swallowed: the
/// offending entry is skipped and the scan continues. Exceeding
/// [`MAX_DIRECTORIES`] aborts the whole scan with [`Error::DirectoryCapExceeded`].
pub fn scan(root: &Utf8Path, options: &ScanOptions) -> Result<ScanResult, Error> {
    let mut queue: VecDeque<Utf8PathBuf> = VecDeque::new();
    if options.include_paths.is_empty() {
        queue.push_back(Utf8PathBuf::new());
    } else {
        for rel in &options.include_paths {
            queue.push_back(normalize_relative(rel));
        }
    }

    let mut visited_canonical: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();
    let mut marker_files = Vec::new();
    let mut directories_visited = 0usize;

    while let Some(rel_dir) = queue.pop_front() {
        let abs_dir = if rel_dir.as_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(&rel_dir)
        };

        let canonical = match std::fs::canonicalize(abs_dir.as_std_path()) {
            Ok(path) => path,
            Err(err) => {
                log::warn!("skipping directory '{}': {}", abs_dir, err);
                continue;
            }
        };
        if !visited_canonical.insert(canonical) {
            continue;
        }

        directories_visited += 1;
        if directories_visited > MAX_DIRECTORIES {
            log::warn!(
                "directory scan aborted after visiting {} directories",
                MAX_DIRECTORIES
            );
            return Err(Error::DirectoryCapExceeded {
                cap: MAX_DIRECTORIES,
            });
        }

        let entries = match std::fs::read_dir(abs_dir.as_std_path()) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("skipping directory '{}': {}", abs_dir, err);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("skipping directory entry under '{}': {}", abs_dir, err);
                    continue;
                }
            };
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue, // non UTF-8 name: unrepresentable, skip.
            };
            let child_rel = if rel_dir.as_str().is_empty() {
                Utf8PathBuf::from(&name)
            } else {
                rel_dir.join(&name)
            };

            // Follow symlinks here (unlike `DirEntry::file_type`) so that a
            // symlinked directory is traversed like any other; the
            // canonicalized visited set above is what actually breaks cycles.
            let metadata = match std::fs::metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::warn!("skipping '{}/{}': {}", abs_dir, name, err);
                    continue;
                }
            };

            if metadata.is_dir() {
                if should_skip_dir(&name, &child_rel, &options.exclude_paths) {
                    continue;
                }
                queue.push_back(child_rel);
            } else if metadata.is_file() {
                if is_excluded(&child_rel, &options.exclude_paths) {
                    continue;
                }
                if is_source_or_header(&child_rel) {
                    files.push(normalize_relative(&child_rel));
                } else if is_module_marker_file(&child_rel) {
                    marker_files.push(normalize_relative(&child_rel));
                }
            }
        }
    }

    Ok(ScanResult {
        files,
        marker_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_source_and_header_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("src/a.cpp"), "").unwrap();
        fs::write(root.join("src/nested/b.h"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();

        let result = scan(root, &ScanOptions::default()).unwrap();
        let mut names: Vec<_> = result.files.iter().map(|p| p.as_str().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["src/a.cpp", "src/nested/b.h"]);
    }

    #[test]
    fn skips_built_in_skip_list_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("build/ignored.cpp"), "").unwrap();
        fs::write(root.join("kept.cpp"), "").unwrap();

        let result = scan(root, &ScanOptions::default()).unwrap();
        assert_eq!(result.files, vec![Utf8PathBuf::from("kept.cpp")]);
    }

    #[test]
    fn exclude_paths_augment_skip_list() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join("vendor")).unwrap();
        fs::write(root.join("vendor/third_party.cpp"), "").unwrap();
        fs::write(root.join("kept.cpp"), "").unwrap();

        let options = ScanOptions {
            include_paths: vec![],
            exclude_paths: vec![Utf8PathBuf::from("vendor")],
        };
        let result = scan(root, &options).unwrap();
        assert_eq!(result.files, vec![Utf8PathBuf::from("kept.cpp")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_directory_cycles_terminate() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/f.cpp"), "").unwrap();
        std::os::unix::fs::symlink(root.join("a"), root.join("a/cycle")).unwrap();

        let result = scan(root, &ScanOptions::default()).unwrap();
        assert_eq!(result.files, vec![Utf8PathBuf::from("a/f.cpp")]);
    }
}
