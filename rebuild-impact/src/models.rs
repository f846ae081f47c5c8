// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data records flowing between the orchestrator, the version-control
//! adapter, and the editor/IDE shell.

use camino::Utf8PathBuf;
use depgraph::modules::ModuleKind;
use serde::{Deserialize, Serialize};

/// The kind of change a file underwent in a commit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChangeKind {
    /// The file was newly added.
    Added,
    /// The file's content was modified.
    Modified,
    /// The file was deleted.
    Deleted,
    /// The file was renamed (and possibly modified).
    Renamed,
}

/// A single file change within a commit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    /// Workspace-relative path, forward-slash normalized.
    pub path: Utf8PathBuf,
    /// The kind of change.
    pub kind: FileChangeKind,
}

/// A single incoming commit and the files it touches.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// The full commit id.
    pub full_id: String,
    /// The commit's message, as-is (not truncated).
    pub message: String,
    /// The commit's author, in whatever form the VCS adapter provides.
    pub author: String,
    /// A display-ready timestamp string, opaque to this crate.
    pub timestamp_string: String,
    /// Files changed by this commit.
    pub changed_files: Vec<FileChange>,
}

impl CommitInfo {
    /// Constructs a `CommitInfo` from a full commit id and the rest of its
    /// fields. The short id is always derived, never supplied directly.
    pub fn new(
        full_id: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        timestamp_string: impl Into<String>,
        changed_files: Vec<FileChange>,
    ) -> Self {
        Self {
            full_id: full_id.into(),
            message: message.into(),
            author: author.into(),
            timestamp_string: timestamp_string.into(),
            changed_files,
        }
    }

    /// The first 8 characters of [`full_id`](Self::full_id).
    ///
    /// If the full id is shorter than 8 characters (e.g. in a test fixture),
    /// the whole id is returned rather than panicking.
    pub fn short_id(&self) -> &str {
        let boundary = self
            .full_id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.full_id.len());
        &self.full_id[..boundary]
    }

    /// The workspace-relative paths this commit touched, in order.
    pub fn changed_paths(&self) -> Vec<Utf8PathBuf> {
        self.changed_files.iter().map(|fc| fc.path.clone()).collect()
    }
}

/// A per-module summary of how many of its files were affected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleImpact {
    /// The module's name.
    pub name: String,
    /// The module's root directory.
    pub root_path: Utf8PathBuf,
    /// How the module was detected.
    #[serde(with = "module_kind_serde")]
    pub kind: ModuleKind,
    /// Total files belonging to the module.
    pub total_files: usize,
    /// Number of those files that were affected.
    pub affected_files_count: usize,
    /// The affected files themselves.
    pub affected_file_list: Vec<Utf8PathBuf>,
}

impl From<depgraph::modules::ModuleImpact> for ModuleImpact {
    fn from(value: depgraph::modules::ModuleImpact) -> Self {
        Self {
            name: value.name,
            root_path: value.root_path,
            kind: value.kind,
            total_files: value.total_files,
            affected_files_count: value.affected_files_count,
            affected_file_list: value.affected_file_list,
        }
    }
}

mod module_kind_serde {
    use depgraph::modules::ModuleKind;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Wire {
        ProjectFile,
        Buildscript,
        CmakeTarget,
        Directory,
    }

    pub fn serialize<S: Serializer>(kind: &ModuleKind, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match kind {
            ModuleKind::ProjectFile => Wire::ProjectFile,
            ModuleKind::Buildscript => Wire::Buildscript,
            ModuleKind::CmakeTarget => Wire::CmakeTarget,
            ModuleKind::Directory => Wire::Directory,
        };
        wire.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ModuleKind, D::Error> {
        let wire = Wire::deserialize(deserializer)?;
        Ok(match wire {
            Wire::ProjectFile => ModuleKind::ProjectFile,
            Wire::Buildscript => ModuleKind::Buildscript,
            Wire::CmakeTarget => ModuleKind::CmakeTarget,
            Wire::Directory => ModuleKind::Directory,
        })
    }
}

/// The result of computing impact for a single commit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitImpact {
    /// The commit this impact was computed for.
    pub commit: CommitInfo,
    /// The percentage of the denominator this commit's rebuild set covers.
    pub impact_pct: f64,
    /// The files this commit changed, as reported by the VCS adapter.
    pub changed_files: Vec<FileChange>,
    /// The rebuild closure for this commit's changed files.
    pub rebuild_files: Vec<Utf8PathBuf>,
    /// Per-module breakdown of `rebuild_files`.
    pub affected_modules: Vec<ModuleImpact>,
}

/// The aggregated result of a full analysis run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImpactReport {
    /// The percentage of the denominator covered by the union of every
    /// commit's rebuild set.
    pub global_impact_pct: f64,
    /// The denominator: `graph.total_files()`, or the VCS-reported tracked
    /// file count when no C/C++ files were discovered.
    pub total_project_files: usize,
    /// `all_rebuild_files.len()`.
    pub total_affected_files: usize,
    /// Per-commit impact breakdowns.
    pub commit_impacts: Vec<CommitImpact>,
    /// The union of every commit's rebuild set.
    pub all_rebuild_files: Vec<Utf8PathBuf>,
    /// Total modules detected.
    pub total_modules: usize,
    /// Number of modules with at least one affected file.
    pub affected_module_count: usize,
    /// Per-module breakdown over `all_rebuild_files`.
    pub module_impacts: Vec<ModuleImpact>,
}

/// UI-coloring thresholds for impact percentages. Not consulted by the core
/// pipeline; published for the editor/IDE shell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImpactThreshold {
    /// `< 10%`
    Low,
    /// `< 30%`
    Medium,
    /// `< 50%`
    High,
    /// `>= 50%`
    Critical,
}

impl ImpactThreshold {
    /// Classifies a percentage into a UI-coloring bucket.
    pub fn classify(pct: f64) -> Self {
        if pct < 10.0 {
            ImpactThreshold::Low
        } else if pct < 30.0 {
            ImpactThreshold::Medium
        } else if pct < 50.0 {
            ImpactThreshold::High
        } else {
            ImpactThreshold::Critical
        }
    }
}
