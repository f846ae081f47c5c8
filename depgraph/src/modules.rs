// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping files into logical modules for human-oriented impact summaries.

use crate::paths::is_source_or_header;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

/// The "< N files" directory-fallback heuristic is arbitrary; call it out as
/// a tunable constant rather than a law (see the Open Questions in the
/// design notes).
pub const MIN_DIRECTORY_MODULE_FILES: usize = 2;

const SOURCE_ROOT_PROBES: &[&str] = &["Source", "src", "Src", "source"];

/// The closed set of ways a module can be detected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleKind {
    /// Adopted directly from a parsed solution/project file.
    ProjectFile,
    /// Detected from a `*.Build.cs` file.
    Buildscript,
    /// Detected from a `CMakeLists.txt` `add_library`/`add_executable` call.
    CmakeTarget,
    /// Detected by bucketing files under a directory.
    Directory,
}

/// A logical grouping of files: a project, library, buildscript-declared
/// unit, or directory.
#[derive(Clone, Debug)]
pub struct ModuleDescriptor {
    /// The module's name.
    pub name: String,
    /// The module's root directory, workspace-relative.
    pub root_path: Utf8PathBuf,
    /// How this module was detected.
    pub kind: ModuleKind,
    /// Every file belonging to this module.
    pub files: HashSet<Utf8PathBuf>,
}

/// A per-module summary of how many of its files were affected by a change.
#[derive(Clone, Debug)]
pub struct ModuleImpact {
    /// The module's name.
    pub name: String,
    /// The module's root directory.
    pub root_path: Utf8PathBuf,
    /// How this module was detected.
    pub kind: ModuleKind,
    /// Total files belonging to the module.
    pub total_files: usize,
    /// Number of those files that were affected.
    pub affected_files_count: usize,
    /// The affected files themselves.
    pub affected_file_list: Vec<Utf8PathBuf>,
}

/// Which strategy to use to detect modules. `Auto` tries each in turn and
/// adopts the first that yields at least one module.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetectionStrategy {
    /// Try pre-built, then buildscript, then CMake, then directory fallback.
    Auto,
    /// Adopt pre-built descriptors from the project-file parser only.
    ProjectFile,
    /// `*.Build.cs` detection only.
    Buildscript,
    /// `CMakeLists.txt` detection only.
    Cmake,
    /// Directory-bucketing fallback only.
    Directory,
}

/// Detects and groups modules within a workspace.
#[derive(Debug, Default)]
pub struct ModuleResolver {
    modules: IndexMap<String, ModuleDescriptor>,
    file_to_module: HashMap<Utf8PathBuf, String>,
}

impl ModuleResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs module detection over `all_files` (the workspace's source and
    /// header files), optionally seeded with `prebuilt` descriptors from the
    /// project-file parser. `marker_files` is the separate set of
    /// module-declaration files (`*.Build.cs`, `CMakeLists.txt`) that the
    /// buildscript and CMake strategies key off of -- they aren't source or
    /// header files themselves, so they're never part of `all_files`.
    pub fn detect(
        &mut self,
        strategy: DetectionStrategy,
        prebuilt: Option<IndexMap<String, ModuleDescriptor>>,
        root: &Utf8Path,
        all_files: &HashSet<Utf8PathBuf>,
        marker_files: &HashSet<Utf8PathBuf>,
    ) {
        let modules = match strategy {
            DetectionStrategy::ProjectFile => prebuilt.unwrap_or_default(),
            DetectionStrategy::Buildscript => detect_buildscript(all_files, marker_files),
            DetectionStrategy::Cmake => detect_cmake(root, all_files, marker_files),
            DetectionStrategy::Directory => detect_directory(all_files),
            DetectionStrategy::Auto => {
                if let Some(prebuilt) = prebuilt.filter(|m| !m.is_empty()) {
                    prebuilt
                } else {
                    let buildscript = detect_buildscript(all_files, marker_files);
                    if !buildscript.is_empty() {
                        buildscript
                    } else {
                        let cmake = detect_cmake(root, all_files, marker_files);
                        if !cmake.is_empty() {
                            cmake
                        } else {
                            detect_directory(all_files)
                        }
                    }
                }
            }
        };

        self.modules = modules;
        self.rebuild_reverse_index();
    }

    fn rebuild_reverse_index(&mut self) {
        self.file_to_module.clear();
        // Stabilize "first registered wins" by sorting module names first:
        // enumeration order otherwise depends on detection order, which
        // isn't guaranteed deterministic across strategies.
        let mut names: Vec<&String> = self.modules.keys().collect();
        names.sort();
        for name in names {
            let module = &self.modules[name];
            for file in &module.files {
                self.file_to_module
                    .entry(file.clone())
                    .or_insert_with(|| name.clone());
            }
        }
    }

    /// Every detected module, keyed by name.
    pub fn modules(&self) -> &IndexMap<String, ModuleDescriptor> {
        &self.modules
    }

    /// The name of the module owning `path`, if any.
    pub fn resolve_file_module(&self, path: &Utf8Path) -> Option<&str> {
        self.file_to_module.get(path).map(|s| s.as_str())
    }

    /// Buckets `affected` by owning module, sorted by `affected_files_count`
    /// descending.
    pub fn group(&self, affected: &BTreeSet<Utf8PathBuf>) -> Vec<ModuleImpact> {
        let mut buckets: HashMap<&str, Vec<Utf8PathBuf>> = HashMap::new();
        for path in affected {
            if let Some(name) = self.resolve_file_module(path) {
                buckets.entry(name).or_default().push(path.clone());
            }
        }

        let mut impacts: Vec<ModuleImpact> = buckets
            .into_iter()
            .filter_map(|(name, mut files)| {
                let module = self.modules.get(name)?;
                files.sort();
                Some(ModuleImpact {
                    name: module.name.clone(),
                    root_path: module.root_path.clone(),
                    kind: module.kind,
                    total_files: module.files.len(),
                    affected_files_count: files.len(),
                    affected_file_list: files,
                })
            })
            .collect();

        impacts.sort_by(|a, b| {
            b.affected_files_count
                .cmp(&a.affected_files_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        impacts
    }
}

fn detect_buildscript(
    all_files: &HashSet<Utf8PathBuf>,
    marker_files: &HashSet<Utf8PathBuf>,
) -> IndexMap<String, ModuleDescriptor> {
    let mut modules: IndexMap<String, ModuleDescriptor> = IndexMap::new();

    let build_cs_files: Vec<&Utf8PathBuf> = marker_files
        .iter()
        .filter(|p| {
            p.file_name()
                .map(|name| name.ends_with(".Build.cs"))
                .unwrap_or(false)
        })
        .collect();

    for build_cs in build_cs_files {
        let dir = build_cs.parent().unwrap_or_else(|| Utf8Path::new(""));
        let basename = build_cs.file_name().unwrap_or_default();
        let name = basename.trim_end_matches(".Build.cs").to_string();

        let files: HashSet<Utf8PathBuf> = all_files
            .iter()
            .filter(|p| p.starts_with(dir) && is_source_or_header(p))
            .cloned()
            .collect();

        modules.entry(name.clone()).or_insert(ModuleDescriptor {
            name,
            root_path: dir.to_path_buf(),
            kind: ModuleKind::Buildscript,
            files,
        });
    }

    modules
}

fn cmake_target_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(add_library|add_executable)\s*\(\s*([A-Za-z0-9_\-\.]+)")
            .expect("static cmake target regex is valid")
    })
}

fn detect_cmake(
    root: &Utf8Path,
    all_files: &HashSet<Utf8PathBuf>,
    marker_files: &HashSet<Utf8PathBuf>,
) -> IndexMap<String, ModuleDescriptor> {
    let mut modules: IndexMap<String, ModuleDescriptor> = IndexMap::new();

    let mut cmake_lists: Vec<&Utf8PathBuf> = marker_files
        .iter()
        .filter(|p| p.file_name() == Some("CMakeLists.txt"))
        .collect();
    cmake_lists.sort();

    for cmake_file in cmake_lists {
        let dir = cmake_file.parent().unwrap_or_else(|| Utf8Path::new(""));
        let abs = root.join(cmake_file);
        let text = match std::fs::read_to_string(abs.as_std_path()) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("skipping unreadable '{}': {}", cmake_file, err);
                continue;
            }
        };

        for caps in cmake_target_regex().captures_iter(&text) {
            let name = caps[2].to_string();
            if name.starts_with('$') || name.starts_with('#') {
                continue; // variable reference or comment, not a literal name.
            }
            // First-seen target name wins on collision.
            modules.entry(name.clone()).or_insert_with(|| {
                let files: HashSet<Utf8PathBuf> = all_files
                    .iter()
                    .filter(|p| p.starts_with(dir) && is_source_or_header(p))
                    .cloned()
                    .collect();
                ModuleDescriptor {
                    name,
                    root_path: dir.to_path_buf(),
                    kind: ModuleKind::CmakeTarget,
                    files,
                }
            });
        }
    }

    modules
}

fn detect_directory(all_files: &HashSet<Utf8PathBuf>) -> IndexMap<String, ModuleDescriptor> {
    let source_root = SOURCE_ROOT_PROBES
        .iter()
        .find(|probe| all_files.iter().any(|p| p.starts_with(probe)));

    let mut buckets: HashMap<String, (Utf8PathBuf, HashSet<Utf8PathBuf>)> = HashMap::new();

    for path in all_files {
        let components: Vec<&str> = path.as_str().split('/').collect();
        let (bucket_key, bucket_root) = match source_root {
            Some(probe) if components.first() == Some(probe) => {
                if components.len() < 2 {
                    continue;
                }
                (components[1].to_string(), Utf8PathBuf::from(format!("{probe}/{}", components[1])))
            }
            Some(_) => continue, // doesn't belong to the source root, skip.
            None => {
                if components.is_empty() {
                    continue;
                }
                (components[0].to_string(), Utf8PathBuf::from(components[0]))
            }
        };

        let entry = buckets
            .entry(bucket_key.clone())
            .or_insert_with(|| (bucket_root, HashSet::new()));
        entry.1.insert(path.clone());
    }

    buckets
        .into_iter()
        .filter(|(_, (_, files))| files.len() >= MIN_DIRECTORY_MODULE_FILES)
        .map(|(name, (root_path, files))| {
            (
                name.clone(),
                ModuleDescriptor {
                    name,
                    root_path,
                    kind: ModuleKind::Directory,
                    files,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> HashSet<Utf8PathBuf> {
        names.iter().map(|n| Utf8PathBuf::from(*n)).collect()
    }

    #[test]
    fn buildscript_detection_groups_by_directory() {
        let all = files(&[
            "Modules/Core/Core.cpp",
            "Modules/Core/Core.h",
            "Modules/Render/Render.cpp",
        ]);
        let markers = files(&[
            "Modules/Core/Core.Build.cs",
            "Modules/Render/Render.Build.cs",
        ]);
        let modules = detect_buildscript(&all, &markers);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules["Core"].files.len(), 2);
        assert_eq!(modules["Render"].files.len(), 1);
    }

    #[test]
    fn cmake_detection_skips_variable_and_comment_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir_all(root.join("libfoo").as_std_path()).unwrap();
        std::fs::write(
            root.join("libfoo/CMakeLists.txt").as_std_path(),
            "# add_library($IGNORED foo.cpp)\nadd_library(foo foo.cpp)\n",
        )
        .unwrap();

        let all = files(&["libfoo/foo.cpp"]);
        let markers = files(&["libfoo/CMakeLists.txt"]);
        let modules = detect_cmake(root, &all, &markers);
        assert_eq!(modules.len(), 1);
        assert!(modules.contains_key("foo"));
    }

    #[test]
    fn directory_fallback_uses_source_root_second_component() {
        let all = files(&[
            "Source/Core/a.cpp",
            "Source/Core/b.cpp",
            "Source/Render/c.cpp",
            "Source/Render/d.cpp",
            "Source/Misc/only_one.cpp",
        ]);
        let modules = detect_directory(&all);
        assert_eq!(modules.len(), 2);
        assert!(modules.contains_key("Core"));
        assert!(modules.contains_key("Render"));
        assert!(!modules.contains_key("Misc"));
    }

    #[test]
    fn directory_fallback_buckets_by_first_component_without_source_root() {
        let all = files(&["alpha/a.cpp", "alpha/b.cpp", "beta/c.cpp"]);
        let modules = detect_directory(&all);
        assert_eq!(modules.len(), 1);
        assert!(modules.contains_key("alpha"));
    }

    #[test]
    fn group_sums_to_total_affected_mapped_to_a_module() {
        let mut resolver = ModuleResolver::new();
        let all = files(&["alpha/a.cpp", "alpha/b.cpp", "beta/c.cpp", "beta/d.cpp"]);
        resolver.detect(
            DetectionStrategy::Directory,
            None,
            Utf8Path::new("/"),
            &all,
            &HashSet::new(),
        );

        let affected: BTreeSet<Utf8PathBuf> = files(&["alpha/a.cpp", "beta/c.cpp", "beta/d.cpp"])
            .into_iter()
            .collect();
        let impacts = resolver.group(&affected);
        let total: usize = impacts.iter().map(|m| m.affected_files_count).sum();
        assert_eq!(total, 3);
        assert_eq!(impacts[0].name, "beta");
    }
}
