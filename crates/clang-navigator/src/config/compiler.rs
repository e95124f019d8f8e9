use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_CLANG_PATH: &str = "clang";

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    /// Clang executable used for AST dumps.
    pub clang_path: String,
    pub include_paths: Vec<String>,
    pub extra_flags: Vec<String>,
    /// Prefer flags from a `compile_commands.json` when one lists the file.
    pub compile_commands: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            clang_path: DEFAULT_CLANG_PATH.to_string(),
            include_paths: Vec::new(),
            extra_flags: Vec::new(),
            compile_commands: true,
        }
    }
}

impl CompilerSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: CompilerSettingsPatch,
    ) {
        if let Some(v) = patch.clang_path {
            self.clang_path = v;
        }
        if let Some(v) = patch.include_paths {
            self.include_paths = v;
        }
        if let Some(v) = patch.extra_flags {
            self.extra_flags = v;
        }
        if let Some(v) = patch.compile_commands {
            self.compile_commands = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.clang_path = self.clang_path.trim().to_string();
        if self.clang_path.is_empty() {
            self.clang_path = DEFAULT_CLANG_PATH.to_string();
        }
        self.include_paths =
            self.include_paths.iter().map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect();
        self.extra_flags = self.extra_flags.iter().map(|f| f.trim().to_string()).filter(|f| !f.is_empty()).collect();
    }
}

/// Make relative paths absolute against `base`.
pub(crate) fn anchor_paths(
    paths: &mut [String],
    base: &Path,
) {
    for path in paths {
        if Path::new(path.as_str()).is_relative() {
            *path = base.join(path.as_str()).display().to_string();
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct CompilerSettingsPatch {
    #[serde(alias = "clang_path")]
    pub(crate) clang_path: Option<String>,
    #[serde(alias = "include_paths")]
    pub(crate) include_paths: Option<Vec<String>>,
    #[serde(alias = "extra_flags")]
    pub(crate) extra_flags: Option<Vec<String>>,
    #[serde(alias = "compile_commands")]
    pub(crate) compile_commands: Option<bool>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
