// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Regex-based `#include "..."` scanning and include resolution.
//!
//! Full preprocessor-aware parsing is intentionally out of scope: this is a
//! line-anchored scan of the quoted include form only. Angle-bracket
//! (system header) includes, conditional compilation, and macro-generated
//! includes are not understood, and over/under-approximation is an accepted
//! tradeoff for the speed this buys on trees with hundreds of thousands of
//! files.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*#\s*include\s*"([^"]+)""#).expect("static include regex is valid")
});

/// Scans `text` for quoted `#include` directives and returns the raw include
/// targets, in the order they appear.
pub fn parse_includes(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| INCLUDE_RE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// An ordered index from lower-cased basename to every workspace-relative
/// path sharing that basename, used for fuzzy include resolution.
pub type FilenameIndex = IndexMap<String, Vec<Utf8PathBuf>>;

/// Resolves a raw `#include "..."` target written in `including_file` to a
/// workspace-relative path, trying each strategy in order:
///
/// 1. Relative to `including_file`'s directory.
/// 2. Relative to the workspace root.
/// 3. Fuzzy match by basename: among files sharing the target's basename,
///    the first whose path ends with the normalized include string; if none
///    matches that way and exactly one candidate shares the basename, it is
///    used.
///
/// Returns `None` if no strategy resolves (the include is dropped, treated
/// as a system header or otherwise unresolvable).
pub fn resolve_include(
    raw_target: &str,
    including_file: &Utf8Path,
    root: &Utf8Path,
    filename_index: &FilenameIndex,
    exists: impl Fn(&Utf8Path) -> bool,
) -> Option<Utf8PathBuf> {
    let normalized = Utf8PathBuf::from(raw_target.replace('\\', "/"));

    // 1. Sibling-relative.
    if let Some(dir) = including_file.parent() {
        let candidate = normalize_joined(dir, &normalized);
        if exists(&root.join(&candidate)) {
            return Some(candidate);
        }
    }

    // 2. Workspace-root-relative.
    if exists(root.join(&normalized).as_path()) {
        return Some(normalized.clone());
    }

    // 3. Fuzzy basename match.
    let basename = normalized
        .file_name()
        .unwrap_or(normalized.as_str())
        .to_ascii_lowercase();
    if let Some(candidates) = filename_index.get(&basename) {
        if let Some(suffix_match) = candidates.iter().find(|c| ends_with_path(c, &normalized)) {
            return Some(suffix_match.clone());
        }
        if candidates.len() == 1 {
            return Some(candidates[0].clone());
        }
    }

    None
}

fn normalize_joined(dir: &Utf8Path, target: &Utf8Path) -> Utf8PathBuf {
    // `Utf8Path::join` doesn't collapse `..`/`.` components; do that by hand
    // so the result is a clean workspace-relative path for comparisons.
    let mut parts: Vec<&str> = Vec::new();
    for component in dir.join(target).as_str().split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    Utf8PathBuf::from(parts.join("/"))
}

fn ends_with_path(candidate: &Utf8Path, suffix: &Utf8Path) -> bool {
    let candidate_parts: Vec<&str> = candidate.as_str().split('/').collect();
    let suffix_parts: Vec<&str> = suffix.as_str().split('/').collect();
    if suffix_parts.len() > candidate_parts.len() {
        return false;
    }
    let offset = candidate_parts.len() - suffix_parts.len();
    candidate_parts[offset..] == suffix_parts[..]
}
