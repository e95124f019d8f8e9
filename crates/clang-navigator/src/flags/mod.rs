//! Compile flags for a source file.
//!
//! Flags come from the nearest `compile_commands.json` when one lists the
//! file, and from the configured include paths and extra flags otherwise.

mod compile_database;

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use tracing::{debug, warn};

pub use compile_database::CompileDatabase;

use crate::config::CompilerSettings;

/// Arguments to hand to Clang, excluding the source file itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompileFlags {
    pub args: Vec<String>,
    /// Directory Clang must run in for relative arguments to resolve.
    pub working_dir: Option<PathBuf>,
}

/// The `-x` language Clang should assume for `path`.
pub fn language_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("c") => "c",
        Some("m") => "objective-c",
        Some("mm") => "objective-c++",
        _ => "c++",
    }
}

/// Resolves and caches compile flags.
#[derive(Debug, Default)]
pub struct FlagsProvider {
    databases: DashMap<PathBuf, Arc<CompileDatabase>>,
}

impl FlagsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags_for(
        &self,
        file: &Path,
        settings: &CompilerSettings,
    ) -> CompileFlags {
        if settings.compile_commands
            && let Some(flags) = self.database_flags(file)
        {
            debug!("[flags] {} from compile_commands.json ({} args)", file.display(), flags.args.len());
            return flags;
        }
        fallback_flags(file, settings)
    }

    /// Forget every cached compilation database.
    pub fn clear(&self) {
        self.databases.clear();
    }

    fn database_flags(
        &self,
        file: &Path,
    ) -> Option<CompileFlags> {
        let db_path = compile_database::find_compile_database(file)?;
        let database = match self.databases.get(&db_path) {
            Some(db) => Arc::clone(&db),
            None => {
                let db = match CompileDatabase::load(&db_path) {
                    Ok(db) => Arc::new(db),
                    Err(error) => {
                        warn!("[flags] {error}");
                        return None;
                    },
                };
                self.databases.insert(db_path, Arc::clone(&db));
                db
            },
        };
        database.flags_for(file).cloned()
    }
}

fn fallback_flags(
    file: &Path,
    settings: &CompilerSettings,
) -> CompileFlags {
    let mut args = vec!["-x".to_string(), language_for(file).to_string()];
    for include in &settings.include_paths {
        args.push("-I".to_string());
        args.push(include.clone());
    }
    args.extend(settings.extra_flags.iter().cloned());
    CompileFlags {
        args,
        working_dir: None,
    }
}

#[derive(Debug)]
pub enum FlagsError {
    Io {
        path: PathBuf,
        reason: String,
    },
    Malformed {
        path: PathBuf,
        reason: String,
    },
}

impl Display for FlagsError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Io {
                path,
                reason,
            } => write!(f, "failed to read {}: {reason}", path.display()),
            Self::Malformed {
                path,
                reason,
            } => write!(f, "{} is not a valid compilation database: {reason}", path.display()),
        }
    }
}

impl std::error::Error for FlagsError {}

#[cfg(test)]
#[path = "../../tests/src/flags/flags_tests.rs"]
mod tests;
