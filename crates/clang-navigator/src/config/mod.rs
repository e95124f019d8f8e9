//! Runtime settings.
//!
//! [`Settings`] starts from defaults and is patched by LSP initialization
//! options, `didChangeConfiguration` payloads and, per file, the nearest
//! `.clang-navigator.toml`.

pub(crate) mod compiler;
pub(crate) mod logging;
pub(crate) mod project;

use std::{collections::HashMap, path::Path};

pub use compiler::{CompilerSettings, DEFAULT_CLANG_PATH};
use compiler::CompilerSettingsPatch;
use logging::LoggingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
pub use project::{PROJECT_CONFIG_FILENAME, find_project_config};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const SETTINGS_SECTION_KEY: &str = "clang-navigator";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub compiler: CompilerSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    /// Apply a settings payload, given either directly or namespaced under
    /// [`SETTINGS_SECTION_KEY`].
    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        let patches = payload_candidates(payload).filter_map(|candidate| SettingsPatch::deserialize(candidate).ok());
        for patch in patches {
            merged.apply_patch(patch);
        }

        merged.normalize();
        merged
    }

    /// These settings with the nearest project file for `source` applied.
    pub fn for_source_file(
        &self,
        source: &Path,
    ) -> Self {
        let mut settings = self.clone();
        let Some(config_path) = find_project_config(source) else {
            return settings;
        };
        let Some(config) = project::load_project_config(&config_path) else {
            return settings;
        };
        debug!("Using project settings from {}", config_path.display());

        if let Some(mut patch) = config.compiler {
            if let (Some(includes), Some(base)) = (patch.include_paths.as_mut(), config_path.parent()) {
                compiler::anchor_paths(includes, base);
            }
            settings.compiler.apply_patch(patch);
            settings.normalize();
        }
        settings
    }

    fn apply_patch(
        &mut self,
        patch: SettingsPatch,
    ) {
        if let Some(p) = patch.compiler {
            self.compiler.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.compiler.normalize();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SettingsPatch {
    compiler: Option<CompilerSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

/// The payload itself, then its `clang-navigator` section if present.
fn payload_candidates(payload: &Value) -> impl Iterator<Item = &Value> {
    std::iter::once(payload).chain(payload.get(SETTINGS_SECTION_KEY))
}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;
