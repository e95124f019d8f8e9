use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use super::compiler::CompilerSettingsPatch;

pub const PROJECT_CONFIG_FILENAME: &str = ".clang-navigator.toml";

/// Walks parent directories from `start` looking for `.clang-navigator.toml`.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() {
        start
    } else {
        start.parent()?
    };
    loop {
        let candidate = dir.join(PROJECT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// The parts of the settings a project may pin in its repository.
///
/// ```toml
/// [compiler]
/// clangPath = "/usr/bin/clang-18"
/// includePaths = ["include", "third_party"]
/// extraFlags = ["-std=c++20"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub(crate) struct ProjectConfig {
    pub(crate) compiler: Option<CompilerSettingsPatch>,
}

pub(crate) fn load_project_config(path: &Path) -> Option<ProjectConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(error) => {
            warn!("Ignoring {}: {error}", path.display());
            None
        },
    }
}
