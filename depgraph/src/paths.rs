// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Path and extension classification helpers.
//!
//! All paths tracked by this crate are workspace-relative and forward-slash
//! normalized, but case-preserved -- comparisons are case-sensitive strings,
//! relying on the filesystem for canonicalization on case-insensitive
//! platforms (see the Open Questions in the design notes).

use camino::{Utf8Path, Utf8PathBuf};

const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hxx", "hh", "inl", "ipp"];

/// Returns true if `ext` (without the leading dot) is a recognized C/C++
/// source extension.
pub fn is_source_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Returns true if `ext` (without the leading dot) is a recognized C/C++
/// header extension.
pub fn is_header_extension(ext: &str) -> bool {
    HEADER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Returns true if `path`'s extension is a recognized source or header
/// extension.
pub fn is_source_or_header(path: &Utf8Path) -> bool {
    match path.extension() {
        Some(ext) => is_source_extension(ext) || is_header_extension(ext),
        None => false,
    }
}

/// Returns true if `path`'s extension is a recognized header extension.
pub fn is_header(path: &Utf8Path) -> bool {
    match path.extension() {
        Some(ext) => is_header_extension(ext),
        None => false,
    }
}

/// Returns true if `path`'s basename identifies a module-declaration file
/// (`*.Build.cs`, `CMakeLists.txt`) rather than a C/C++ source or header --
/// these are tracked separately from [`is_source_or_header`] since they
/// never participate in `#include` resolution but are still needed to
/// detect modules.
pub fn is_module_marker_file(path: &Utf8Path) -> bool {
    match path.file_name() {
        Some(name) => name == "CMakeLists.txt" || name.ends_with(".Build.cs"),
        None => false,
    }
}

/// Normalizes a path to forward-slash separators, preserving case.
pub fn normalize_relative(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(path.as_str().replace('\\', "/"))
}

/// Returns the lower-cased basename of `path`, used as a `FilenameIndex` key.
pub fn lower_basename(path: &Utf8Path) -> String {
    path.file_name().unwrap_or("").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert!(is_source_extension("cpp"));
        assert!(is_source_extension("CPP"));
        assert!(is_header_extension("hpp"));
        assert!(!is_source_extension("hpp"));
        assert!(!is_header_extension("cpp"));
        assert!(!is_source_extension("rs"));
    }

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(
            normalize_relative(Utf8Path::new("Module\\Sub\\Foo.h")),
            Utf8PathBuf::from("Module/Sub/Foo.h")
        );
    }

    #[test]
    fn lower_basename_keeps_case_of_full_path_out() {
        assert_eq!(lower_basename(Utf8Path::new("src/Module/Foo.H")), "foo.h");
    }

    #[test]
    fn recognizes_module_marker_files() {
        assert!(is_module_marker_file(Utf8Path::new(
            "Modules/Core/Core.Build.cs"
        )));
        assert!(is_module_marker_file(Utf8Path::new(
            "libfoo/CMakeLists.txt"
        )));
        assert!(!is_module_marker_file(Utf8Path::new("src/a.cpp")));
    }
}
