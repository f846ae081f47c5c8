// Copyright (c) The rebuild-impact Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration value set the core receives. Storage, UI, and
//! `auto_scan` startup behavior live in the editor/IDE shell; this struct is
//! just the recognized shape.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Which module-detection strategy to run, mirroring
/// [`depgraph::modules::DetectionStrategy`] plus a `None` variant meaning
/// "skip module detection entirely".
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleDetectionStrategy {
    /// Try pre-built, then buildscript, then CMake, then directory fallback.
    #[default]
    Auto,
    /// Adopt pre-built descriptors from the project-file parser only.
    ProjectFile,
    /// `*.Build.cs` detection only.
    Buildscript,
    /// `CMakeLists.txt` detection only.
    Cmake,
    /// Directory-bucketing fallback only.
    Directory,
    /// Skip module detection; `module_impacts` will be empty.
    None,
}

/// The recognized configuration options (see the external-interfaces design
/// section). Every field has a default so a partial configuration value
/// deserializes cleanly.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace-relative path to a solution or project file. Empty means
    /// no build-scope filtering.
    pub project_file: String,
    /// Workspace-relative roots to limit scanning to. Empty means the
    /// entire workspace.
    pub include_paths: Vec<Utf8PathBuf>,
    /// Workspace-relative paths to exclude, beyond the built-in skip list.
    pub exclude_paths: Vec<Utf8PathBuf>,
    /// Which module-detection strategy to run.
    pub module_detection: ModuleDetectionStrategy,
}

impl Config {
    /// Returns `project_file` as an `Option`, `None` if it's empty.
    pub fn project_file_path(&self) -> Option<Utf8PathBuf> {
        if self.project_file.is_empty() {
            None
        } else {
            Some(Utf8PathBuf::from(&self.project_file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_project_file() {
        let config = Config::default();
        assert_eq!(config.project_file_path(), None);
        assert_eq!(config.module_detection, ModuleDetectionStrategy::Auto);
    }

    #[test]
    fn partial_json_deserializes_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"project_file": "Game.sln"}"#).unwrap();
        assert_eq!(config.project_file_path(), Some(Utf8PathBuf::from("Game.sln")));
        assert!(config.include_paths.is_empty());
        assert_eq!(config.module_detection, ModuleDetectionStrategy::Auto);
    }
}
