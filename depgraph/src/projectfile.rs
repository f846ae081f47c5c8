// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parses Visual Studio solution (`.sln`) and project (`.vcxproj`) files to
//! learn which files actually participate in a build -- the denominator for
//! impact percentages, and a first-class source of module descriptors.

use crate::modules::{ModuleDescriptor, ModuleKind};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SLN_PROJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^Project\("\{[^}]+\}"\)\s*=\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"\{[^}]+\}""#)
        .expect("static solution project regex is valid")
});

static PROJECT_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<Cl(Compile|Include)\s+Include\s*=\s*"([^"]+)""#)
        .expect("static project item regex is valid")
});

/// The result of parsing a solution or project file: the set of files that
/// are part of the build, and one descriptor per discovered module.
#[derive(Clone, Debug, Default)]
pub struct ProjectFileResult {
    /// Every file referenced by the solution/project, workspace-relative.
    pub project_scope: HashSet<Utf8PathBuf>,
    /// One descriptor per project (or the single project, for a standalone
    /// project file), keyed by name.
    pub modules: IndexMap<String, ModuleDescriptor>,
}

/// Parses `path` (workspace-relative, rooted at `root`) as a solution or
/// project file.
///
/// Malformed input or an unsupported extension never fails outright: a
/// warning is logged and an empty result is returned, so the caller can
/// fall back to full-workspace scope.
pub fn parse(root: &Utf8Path, path: &Utf8Path) -> ProjectFileResult {
    match path.extension().map(|ext| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "sln" => parse_solution(root, path),
        Some(ext) if ext == "vcxproj" => {
            let mut result = ProjectFileResult::default();
            if let Some(descriptor) = parse_project(root, path) {
                result.project_scope.extend(descriptor.files.iter().cloned());
                result.modules.insert(descriptor.name.clone(), descriptor);
            }
            result
        }
        _ => {
            log::warn!("unsupported project file extension for '{}'", path);
            ProjectFileResult::default()
        }
    }
}

fn parse_solution(root: &Utf8Path, sln_path: &Utf8Path) -> ProjectFileResult {
    let abs = root.join(sln_path);
    let text = match std::fs::read_to_string(abs.as_std_path()) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("failed to read solution '{}': {}", sln_path, err);
            return ProjectFileResult::default();
        }
    };

    let sln_dir = sln_path.parent().unwrap_or_else(|| Utf8Path::new(""));
    let mut result = ProjectFileResult::default();

    for caps in SLN_PROJECT_RE.captures_iter(&text) {
        let raw_rel_path = &caps[2];
        let rel_path = Utf8PathBuf::from(raw_rel_path.replace('\\', "/"));
        let project_path = match resolve_relative(sln_dir, &rel_path) {
            Some(path) => path,
            None => continue, // escapes the workspace root.
        };

        if !root.join(&project_path).as_std_path().is_file() {
            continue;
        }
        let is_vcxproj = project_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("vcxproj"))
            .unwrap_or(false);
        if !is_vcxproj {
            continue;
        }

        if let Some(descriptor) = parse_project(root, &project_path) {
            result.project_scope.extend(descriptor.files.iter().cloned());
            result.modules.insert(descriptor.name.clone(), descriptor);
        }
    }

    result
}

fn parse_project(root: &Utf8Path, proj_path: &Utf8Path) -> Option<ModuleDescriptor> {
    let abs = root.join(proj_path);
    let text = match std::fs::read_to_string(abs.as_std_path()) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("failed to read project '{}': {}", proj_path, err);
            return None;
        }
    };

    let proj_dir = proj_path.parent().unwrap_or_else(|| Utf8Path::new(""));
    let mut files = HashSet::new();

    for caps in PROJECT_ITEM_RE.captures_iter(&text) {
        let raw = caps[2].replace('\\', "/");
        let raw_path = Utf8PathBuf::from(&raw);
        match resolve_relative(proj_dir, &raw_path) {
            Some(resolved) => {
                files.insert(resolved);
            }
            None => continue, // escapes the workspace root.
        }
    }

    let name = proj_path
        .file_stem()
        .unwrap_or("project")
        .to_string();

    Some(ModuleDescriptor {
        name,
        root_path: proj_dir.to_path_buf(),
        kind: ModuleKind::ProjectFile,
        files,
    })
}

/// Joins `target` onto `base_dir` and collapses `.`/`..` components.
/// Returns `None` if doing so would climb above the workspace root (a `..`
/// with nothing left to pop), i.e. the entry escapes the workspace.
fn resolve_relative(base_dir: &Utf8Path, target: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut parts: Vec<&str> = Vec::new();
    let joined = if base_dir.as_str().is_empty() {
        target.to_path_buf()
    } else {
        base_dir.join(target)
    };
    for component in joined.as_str().split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return None;
                }
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(Utf8PathBuf::from(parts.join("/")))
}
