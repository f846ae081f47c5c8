// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The orchestrator: sequences scope parsing, graph warm-start/scan, module
//! detection, and per-commit impact computation into a single
//! [`ImpactReport`].

use crate::config::{Config, ModuleDetectionStrategy};
use crate::errors::Error;
use crate::models::{CommitImpact, ImpactReport, ModuleImpact};
use crate::vcs::VcsAdapter;
use camino::Utf8PathBuf;
use depgraph::cache::GraphCache;
use depgraph::graph::{BuildOptions, DependencyGraph};
use depgraph::modules::{DetectionStrategy, ModuleResolver};
use depgraph::projectfile;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A process-wide single-slot resource modeling the "analysis in progress"
/// flag (§5 of the design): a second `run` while one is in flight is
/// rejected rather than queued.
#[derive(Clone, Debug, Default)]
pub struct AnalysisGuardSlot(Arc<AtomicBool>);

impl AnalysisGuardSlot {
    /// Creates a free slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the slot. Returns `None` if it's already held.
    fn acquire(&self) -> Option<AnalysisGuard> {
        if self
            .0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(AnalysisGuard(self.0.clone()))
        } else {
            None
        }
    }
}

/// RAII handle released automatically when an analysis completes (including
/// on early return or panic-unwind), so the slot can never be left stuck
/// held.
struct AnalysisGuard(Arc<AtomicBool>);

impl Drop for AnalysisGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Loads a cache blob for a given workspace root. Persistence is opaque to
/// this crate -- any key-value store suffices, as described in the external
/// interfaces -- so this is a narrow trait rather than a concrete file path.
pub trait CacheStore {
    /// Loads the previously persisted cache, if any.
    fn load(&self) -> Option<String>;
    /// Persists `json` as the new cache contents. Failures are logged and
    /// otherwise ignored: cache persistence is best-effort.
    fn save(&self, json: &str);
}

/// A [`CacheStore`] that never persists anything; useful for one-shot
/// analyses or tests that don't care about warm starts.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCacheStore;

impl CacheStore for NoCacheStore {
    fn load(&self) -> Option<String> {
        None
    }
    fn save(&self, _json: &str) {}
}

/// Sequences the rebuild-impact pipeline described in the design: scope
/// parse, graph warm-load, scan, module detection, commit enumeration, and
/// per-commit BFS.
pub struct ChangeAnalyzer<'a, V, C> {
    root: Utf8PathBuf,
    config: Config,
    vcs: &'a V,
    cache_store: &'a C,
    guard_slot: AnalysisGuardSlot,
}

impl<'a, V, C> ChangeAnalyzer<'a, V, C>
where
    V: VcsAdapter,
    C: CacheStore,
{
    /// Creates a new analyzer for `root`, using `vcs` to enumerate incoming
    /// commits and `cache_store` to warm-start/persist the dependency graph.
    pub fn new(root: impl Into<Utf8PathBuf>, config: Config, vcs: &'a V, cache_store: &'a C) -> Self {
        Self {
            root: root.into(),
            config,
            vcs,
            cache_store,
            guard_slot: AnalysisGuardSlot::new(),
        }
    }

    /// Returns a clone of the guard slot, so callers can share a single
    /// process-wide "analysis in progress" flag across multiple analyzers
    /// (e.g. one per workspace root opened in the same process).
    pub fn guard_slot(&self) -> AnalysisGuardSlot {
        self.guard_slot.clone()
    }

    /// Uses an externally supplied guard slot instead of this analyzer's own.
    pub fn with_guard_slot(mut self, slot: AnalysisGuardSlot) -> Self {
        self.guard_slot = slot;
        self
    }

    /// Runs the full pipeline and returns the aggregated report.
    ///
    /// Rejected with [`Error::AnalysisInProgress`] if another analysis using
    /// the same guard slot is already running.
    pub fn run(&self) -> Result<ImpactReport, Error> {
        let _guard = self.guard_slot.acquire().ok_or(Error::AnalysisInProgress)?;

        // 1-2. Build scope, if a project file is configured.
        let project_file_result = self
            .config
            .project_file_path()
            .map(|rel| projectfile::parse(&self.root, &rel));

        let project_scope = project_file_result
            .as_ref()
            .map(|r| &r.project_scope)
            .filter(|scope| !scope.is_empty())
            .cloned();
        log::debug!(
            "project-file scope: {}",
            project_scope.as_ref().map(|s| s.len()).unwrap_or(0)
        );

        // 3. Warm-start, scan, persist.
        let mut graph = DependencyGraph::new(self.root.clone());
        if let Some(cached_json) = self.cache_store.load() {
            match GraphCache::from_json(&cached_json) {
                Ok(cache) => {
                    if let Err(err) = graph.load_cache(cache) {
                        log::warn!("discarding graph cache: {}", err);
                        graph = DependencyGraph::new(self.root.clone());
                    }
                }
                Err(err) => log::warn!("discarding corrupt graph cache: {}", err),
            }
        }

        let build_options = BuildOptions {
            include_paths: self.config.include_paths.clone(),
            exclude_paths: self.config.exclude_paths.clone(),
            project_scope: project_scope.clone(),
        };
        graph.build(&build_options)?;

        let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        match graph.to_cache(built_at).to_json() {
            Ok(json) => self.cache_store.save(&json),
            Err(err) => log::warn!("failed to encode graph cache: {}", err),
        }

        log::debug!("dependency graph built: {} files tracked", graph.total_files());

        // 4. Enumerate incoming commits.
        let commits = self.vcs.incoming_commits()?;

        // 5. Module detection.
        let all_files = graph.all_files();
        let mut resolver = ModuleResolver::new();
        if self.config.module_detection != ModuleDetectionStrategy::None {
            let strategy = match self.config.module_detection {
                ModuleDetectionStrategy::Auto => DetectionStrategy::Auto,
                ModuleDetectionStrategy::ProjectFile => DetectionStrategy::ProjectFile,
                ModuleDetectionStrategy::Buildscript => DetectionStrategy::Buildscript,
                ModuleDetectionStrategy::Cmake => DetectionStrategy::Cmake,
                ModuleDetectionStrategy::Directory => DetectionStrategy::Directory,
                ModuleDetectionStrategy::None => unreachable!(),
            };
            let prebuilt = project_file_result.map(|r| r.modules);
            resolver.detect(
                strategy,
                prebuilt,
                &self.root,
                &all_files,
                graph.marker_files(),
            );
        }

        // 6. Determine the denominator.
        let graph_total = graph.total_files();
        let (total_project_files, expand_via_graph) = if graph_total > 0 {
            (graph_total, true)
        } else {
            (self.vcs.tracked_file_count()?, false)
        };

        // 7. Per-commit impact.
        let mut all_rebuild: BTreeSet<Utf8PathBuf> = BTreeSet::new();
        let mut commit_impacts = Vec::with_capacity(commits.len());
        for commit in commits {
            let changed_paths = commit.changed_paths();
            let rebuild_files: BTreeSet<Utf8PathBuf> = if expand_via_graph {
                graph.affected(&changed_paths)
            } else {
                changed_paths.iter().cloned().collect()
            };
            all_rebuild.extend(rebuild_files.iter().cloned());

            let affected_modules: Vec<ModuleImpact> = resolver
                .group(&rebuild_files)
                .into_iter()
                .map(ModuleImpact::from)
                .collect();

            let impact_pct = depgraph::estimator::percentage(rebuild_files.len(), total_project_files);
            let changed_files = commit.changed_files.clone();
            commit_impacts.push(CommitImpact {
                commit,
                impact_pct,
                changed_files,
                rebuild_files: rebuild_files.into_iter().collect(),
                affected_modules,
            });
        }

        // 8. Global aggregation.
        let global_impact_pct =
            depgraph::estimator::percentage(all_rebuild.len(), total_project_files);
        let module_impacts: Vec<ModuleImpact> = resolver
            .group(&all_rebuild)
            .into_iter()
            .map(ModuleImpact::from)
            .collect();
        let affected_module_count = module_impacts
            .iter()
            .filter(|m| m.affected_files_count > 0)
            .count();

        Ok(ImpactReport {
            global_impact_pct,
            total_project_files,
            total_affected_files: all_rebuild.len(),
            commit_impacts,
            all_rebuild_files: all_rebuild.into_iter().collect_vec(),
            total_modules: resolver.modules().len(),
            affected_module_count,
            module_impacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitInfo, FileChange, FileChangeKind};
    use crate::vcs::StaticVcsAdapter;
    use std::fs;

    fn write(root: &camino::Utf8Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path()).unwrap();
        }
        fs::write(path.as_std_path(), contents).unwrap();
    }

    fn change(path: &str) -> FileChange {
        FileChange {
            path: Utf8PathBuf::from(path),
            kind: FileChangeKind::Modified,
        }
    }

    fn commit(id: &str, files: Vec<FileChange>) -> CommitInfo {
        CommitInfo::new(id, "msg", "author", "2026-01-01T00:00:00Z", files)
    }

    #[test]
    fn scenario_a_single_file_change() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        write(root, "a.cpp", "int main() {}\n");
        write(root, "b.cpp", "int other() {}\n");

        let vcs = StaticVcsAdapter::new(vec![commit("c1", vec![change("a.cpp")])], 0);
        let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
        let report = analyzer.run().unwrap();

        assert_eq!(report.global_impact_pct, 50.0);
        assert_eq!(report.total_affected_files, 1);
    }

    #[test]
    fn scenario_b_header_fan_out() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        write(root, "util.h", "// shared\n");
        for name in ["a", "b", "c"] {
            write(root, &format!("{name}.cpp"), "#include \"util.h\"\n");
        }

        let vcs = StaticVcsAdapter::new(vec![commit("c1", vec![change("util.h")])], 0);
        let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
        let report = analyzer.run().unwrap();

        assert_eq!(report.global_impact_pct, 100.0);
        assert_eq!(report.total_affected_files, 4);
    }

    #[test]
    fn scenario_e_no_incoming_commits() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        write(root, "a.cpp", "");

        let vcs = StaticVcsAdapter::new(vec![], 0);
        let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
        let report = analyzer.run().unwrap();

        assert!(report.commit_impacts.is_empty());
        assert_eq!(report.global_impact_pct, 0.0);
        assert_eq!(report.total_affected_files, 0);
    }

    #[test]
    fn scenario_f_non_cpp_workspace_falls_back_to_vcs_tracked_count() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        write(root, "README.md", "no cpp here");

        let vcs = StaticVcsAdapter::new(
            vec![commit("c1", vec![change("a.ts"), change("b.ts")])],
            20,
        );
        let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
        let report = analyzer.run().unwrap();

        assert_eq!(report.total_project_files, 20);
        assert_eq!(report.global_impact_pct, 10.0);
    }

    #[test]
    fn buildscript_modules_are_detected_through_the_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        write(root, "Modules/Core/Core.Build.cs", "// module decl\n");
        write(root, "Modules/Core/core.h", "// leaf\n");
        write(root, "Modules/Core/core.cpp", "#include \"core.h\"\n");
        write(root, "Modules/Render/Render.Build.cs", "// module decl\n");
        write(root, "Modules/Render/render.cpp", "// standalone\n");

        let vcs = StaticVcsAdapter::new(
            vec![commit("c1", vec![change("Modules/Core/core.h")])],
            0,
        );
        let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
        let report = analyzer.run().unwrap();

        assert_eq!(report.total_modules, 2);
        assert_eq!(report.module_impacts.len(), 1);
        assert_eq!(report.module_impacts[0].name, "Core");
        assert_eq!(report.module_impacts[0].affected_files_count, 2);
    }

    #[test]
    fn second_concurrent_run_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = camino::Utf8Path::from_path(dir.path()).unwrap();
        write(root, "a.cpp", "");

        let vcs = StaticVcsAdapter::new(vec![], 0);
        let analyzer = ChangeAnalyzer::new(root, Config::default(), &vcs, &NoCacheStore);
        let slot = analyzer.guard_slot();
        let held = slot.acquire().unwrap();

        let err = analyzer.run().unwrap_err();
        assert!(matches!(err, Error::AnalysisInProgress));
        drop(held);

        assert!(analyzer.run().is_ok());
    }
}
