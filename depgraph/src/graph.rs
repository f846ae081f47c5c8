// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reverse-dependency graph over a C/C++ workspace: scanning, include
//! resolution, incremental refresh, and rebuild-closure BFS.

use crate::cache::{CachedFile, GraphCache};
use crate::errors::Error;
use crate::include_parse::{self, FilenameIndex};
use crate::paths::{is_header, normalize_relative};
use crate::scan::{self, ScanOptions};
use camino::{Utf8Path, Utf8PathBuf};
use petgraph::graphmap::GraphMap;
use petgraph::Directed;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::time::UNIX_EPOCH;

/// An opaque, `Copy` handle to an interned workspace-relative path.
///
/// `petgraph::graphmap::GraphMap` requires `Copy + Ord + Hash` node weights;
/// paths aren't `Copy`, so they're interned once and referred to by this
/// small integer handle everywhere else, the same way build-graph tools
/// intern file names into dense integer IDs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct PathId(u32);

#[derive(Debug, Default)]
struct Interner {
    paths: Vec<Utf8PathBuf>,
    ids: HashMap<Utf8PathBuf, PathId>,
}

impl Interner {
    fn intern(&mut self, path: &Utf8Path) -> PathId {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }
        let id = PathId(self.paths.len() as u32);
        self.paths.push(path.to_path_buf());
        self.ids.insert(path.to_path_buf(), id);
        id
    }

    fn lookup(&self, path: &Utf8Path) -> Option<PathId> {
        self.ids.get(path).copied()
    }

    fn path(&self, id: PathId) -> &Utf8Path {
        &self.paths[id.0 as usize]
    }
}

/// Options controlling a [`DependencyGraph::build`] pass.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Workspace-relative roots to scan. Empty means the whole workspace.
    pub include_paths: Vec<Utf8PathBuf>,
    /// Workspace-relative paths to exclude, beyond the built-in skip list.
    pub exclude_paths: Vec<Utf8PathBuf>,
    /// If set, scopes [`DependencyGraph::total_files`] and filters the
    /// result of [`DependencyGraph::affected`]. Does not affect what is
    /// scanned: a header outside the scope can still affect files inside it.
    pub project_scope: Option<HashSet<Utf8PathBuf>>,
}

/// The reverse-dependency graph over a workspace's C/C++ files.
#[derive(Debug)]
pub struct DependencyGraph {
    root: Utf8PathBuf,
    interner: Interner,
    files: HashSet<PathId>,
    mtimes: HashMap<PathId, i64>,
    resolved_includes: HashMap<PathId, Vec<PathId>>,
    reverse_deps: GraphMap<PathId, (), Directed>,
    filename_index: FilenameIndex,
    project_scope: Option<HashSet<Utf8PathBuf>>,
    marker_files: HashSet<Utf8PathBuf>,
}

impl DependencyGraph {
    /// Creates an empty graph rooted at `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            interner: Interner::default(),
            files: HashSet::new(),
            mtimes: HashMap::new(),
            resolved_includes: HashMap::new(),
            reverse_deps: GraphMap::new(),
            filename_index: FilenameIndex::new(),
            project_scope: None,
            marker_files: HashSet::new(),
        }
    }

    /// The workspace root this graph was built against.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Loads a previously persisted snapshot, warm-starting `mtimes`,
    /// `resolved_includes`, the reverse-dependency graph, and the filename
    /// index so that queries are correct without re-parsing unchanged files.
    ///
    /// Returns [`Error::CacheRootMismatch`] (and leaves `self` untouched) if
    /// the cache's root doesn't match this graph's root; callers should
    /// discard the cache and fall back to a cold build in that case.
    pub fn load_cache(&mut self, cache: GraphCache) -> Result<(), Error> {
        if normalize_relative(&cache.root_path) != normalize_relative(&self.root) {
            return Err(Error::CacheRootMismatch {
                expected: self.root.clone(),
                found: cache.root_path,
            });
        }

        for (path, entry) in cache.files {
            let id = self.interner.intern(&path);
            self.files.insert(id);
            self.mtimes.insert(id, entry.mtime);
            let include_ids: Vec<PathId> = entry
                .includes
                .iter()
                .map(|inc| self.interner.intern(inc))
                .collect();
            for &included in &include_ids {
                self.reverse_deps.add_edge(included, id, ());
            }
            self.resolved_includes.insert(id, include_ids);
            self.filename_index
                .entry(crate::paths::lower_basename(&path))
                .or_default()
                .push(path);
        }
        Ok(())
    }

    /// Serializes the current state of the graph for persistence.
    pub fn to_cache(&self, built_at: impl Into<String>) -> GraphCache {
        let mut files = std::collections::BTreeMap::new();
        for &id in &self.files {
            let path = self.interner.path(id).to_path_buf();
            let includes = self
                .resolved_includes
                .get(&id)
                .map(|ids| ids.iter().map(|&i| self.interner.path(i).to_path_buf()).collect())
                .unwrap_or_default();
            files.insert(
                path,
                CachedFile {
                    mtime: *self.mtimes.get(&id).unwrap_or(&0),
                    includes,
                },
            );
        }
        GraphCache {
            root_path: self.root.clone(),
            built_at: built_at.into(),
            files,
        }
    }

    /// Scans the workspace, parses includes for new or changed files, and
    /// purges entries for files that no longer exist. Safe to call
    /// repeatedly: an unchanged filesystem yields an unchanged graph and
    /// re-parses nothing.
    pub fn build(&mut self, options: &BuildOptions) -> Result<(), Error> {
        self.project_scope = options.project_scope.clone();

        let scan_options = ScanOptions {
            include_paths: options.include_paths.clone(),
            exclude_paths: options.exclude_paths.clone(),
        };
        let scan_result = scan::scan(&self.root, &scan_options)?;
        let discovered: HashSet<Utf8PathBuf> = scan_result.files.into_iter().collect();
        self.marker_files = scan_result.marker_files.into_iter().collect();

        let previously_known: HashSet<Utf8PathBuf> = self
            .files
            .iter()
            .map(|&id| self.interner.path(id).to_path_buf())
            .collect();

        let removed_files: Vec<Utf8PathBuf> = previously_known
            .difference(&discovered)
            .cloned()
            .collect();
        for removed in &removed_files {
            self.remove_file(removed);
        }

        let mut to_parse: Vec<Utf8PathBuf> = Vec::new();
        for path in &discovered {
            let id = self.interner.intern(path);
            let is_new = self.files.insert(id);
            if is_new {
                self.filename_index
                    .entry(crate::paths::lower_basename(path))
                    .or_default()
                    .push(path.clone());
            }

            let abs = self.root.join(path);
            let mtime = file_mtime_ms(&abs);
            let changed = match self.mtimes.get(&id) {
                Some(&cached) => mtime != cached,
                None => true,
            };
            if changed {
                to_parse.push(path.clone());
                self.mtimes.insert(id, mtime);
            }
        }

        for path in &to_parse {
            self.parse_file(path);
        }

        log::debug!(
            "graph build complete: {} files tracked, {} re-parsed, {} removed",
            self.files.len(),
            to_parse.len(),
            removed_files.len()
        );

        Ok(())
    }

    fn remove_file(&mut self, path: &Utf8Path) {
        if let Some(id) = self.interner.lookup(path) {
            self.files.remove(&id);
            self.mtimes.remove(&id);
            self.resolved_includes.remove(&id);
            if self.reverse_deps.contains_node(id) {
                self.reverse_deps.remove_node(id);
            }
            if let Some(bucket) = self.filename_index.get_mut(&crate::paths::lower_basename(path)) {
                bucket.retain(|p| p != path);
            }
        }
    }

    fn purge_outgoing_edges(&mut self, id: PathId) {
        if let Some(old_includes) = self.resolved_includes.get(&id).cloned() {
            for included in old_includes {
                self.reverse_deps.remove_edge(included, id);
            }
        }
    }

    fn parse_file(&mut self, path: &Utf8PathBuf) {
        let id = self.interner.intern(path);
        self.purge_outgoing_edges(id);

        let abs = self.root.join(path);
        let text = match std::fs::read_to_string(abs.as_std_path()) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("skipping unreadable file '{}': {}", path, err);
                self.resolved_includes.insert(id, Vec::new());
                return;
            }
        };

        let raw_targets = include_parse::parse_includes(&text);
        let mut resolved = Vec::new();
        let root = self.root.clone();
        for raw in raw_targets {
            let resolved_path = include_parse::resolve_include(
                &raw,
                path,
                &root,
                &self.filename_index,
                |candidate| candidate.as_std_path().is_file(),
            );
            if let Some(target) = resolved_path {
                let target_id = self.interner.intern(&target);
                self.reverse_deps.add_edge(target_id, id, ());
                resolved.push(target_id);
            }
        }
        self.resolved_includes.insert(id, resolved);
    }

    /// The number of files that directly `#include` `path`.
    pub fn dependent_count(&self, path: &Utf8Path) -> usize {
        match self.interner.lookup(path) {
            Some(id) if self.reverse_deps.contains_node(id) => {
                self.reverse_deps.neighbors(id).count()
            }
            _ => 0,
        }
    }

    /// The denominator used for impact percentages: the size of the
    /// configured project scope if set, else the number of discovered files.
    pub fn total_files(&self) -> usize {
        match &self.project_scope {
            Some(scope) => scope.len(),
            None => self.files.len(),
        }
    }

    /// Returns every file in the currently discovered (or scoped) file set.
    pub fn all_files(&self) -> HashSet<Utf8PathBuf> {
        self.files
            .iter()
            .map(|&id| self.interner.path(id).to_path_buf())
            .collect()
    }

    /// Returns every module-declaration file (`*.Build.cs`, `CMakeLists.txt`)
    /// discovered by the last [`DependencyGraph::build`] call. These aren't
    /// part of [`DependencyGraph::all_files`] since they never participate
    /// in `#include` resolution, but [`crate::modules::ModuleResolver`]
    /// needs them to locate buildscript/CMake module declarations.
    pub fn marker_files(&self) -> &HashSet<Utf8PathBuf> {
        &self.marker_files
    }

    /// Computes the rebuild closure for a set of changed files: the inputs
    /// themselves, plus every file that transitively includes a changed
    /// header.
    ///
    /// Source (`.cpp`) changes never propagate -- only the file itself needs
    /// to recompile. Header changes propagate through the inclusion graph to
    /// every translation unit that transitively includes them. When a
    /// project scope is configured, the result is filtered to it.
    pub fn affected(&self, changed: &[Utf8PathBuf]) -> BTreeSet<Utf8PathBuf> {
        let mut result: BTreeSet<Utf8PathBuf> =
            changed.iter().map(|p| normalize_relative(p)).collect();

        let mut queue: VecDeque<PathId> = VecDeque::new();
        for path in &result {
            if is_header(path) {
                if let Some(id) = self.interner.lookup(path) {
                    queue.push_back(id);
                }
            }
        }

        while let Some(id) = queue.pop_front() {
            if !self.reverse_deps.contains_node(id) {
                continue;
            }
            for dependent_id in self.reverse_deps.neighbors(id) {
                let dependent_path = self.interner.path(dependent_id).to_path_buf();
                if result.insert(dependent_path.clone()) && is_header(&dependent_path) {
                    queue.push_back(dependent_id);
                }
            }
        }

        match &self.project_scope {
            Some(scope) => result.into_iter().filter(|p| scope.contains(p)).collect(),
            None => result,
        }
    }
}

fn file_mtime_ms(path: &Utf8Path) -> i64 {
    std::fs::metadata(path.as_std_path())
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|dur| dur.as_millis() as i64)
        .unwrap_or(0)
}
