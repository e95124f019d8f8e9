use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{CompileFlags, FlagsError};

pub(crate) const COMPILE_DATABASE_FILENAME: &str = "compile_commands.json";

/// One shell word: runs of unquoted text, escapes and quoted segments.
static SHELL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:[^\s"'\\]|\\.|"(?:[^"\\]|\\.)*"|'[^']*')+"#).unwrap());

#[derive(Debug, Deserialize)]
struct RawEntry {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    command: Option<String>,
}

/// A parsed `compile_commands.json`, keyed by absolute source path.
#[derive(Debug, Default)]
pub struct CompileDatabase {
    entries: HashMap<PathBuf, CompileFlags>,
}

impl CompileDatabase {
    pub fn load(path: &Path) -> Result<Self, FlagsError> {
        let content = std::fs::read_to_string(path).map_err(|error| FlagsError::Io {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Self::from_json(&content).map_err(|error| FlagsError::Malformed {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawEntry> = serde_json::from_str(json)?;
        let mut entries = HashMap::with_capacity(raw.len());
        for entry in raw {
            let file = if entry.file.is_absolute() {
                entry.file.clone()
            } else {
                entry.directory.join(&entry.file)
            };
            let argv = match (entry.arguments, entry.command) {
                (Some(arguments), _) => arguments,
                (None, Some(command)) => split_command(&command),
                (None, None) => continue,
            };
            let flags = CompileFlags {
                args: sanitize_arguments(&argv, &entry.file, &file),
                working_dir: Some(entry.directory),
            };
            // The first entry for a file wins, like most tools reading the database.
            entries.entry(file).or_insert(flags);
        }
        Ok(Self {
            entries,
        })
    }

    pub fn flags_for(
        &self,
        file: &Path,
    ) -> Option<&CompileFlags> {
        self.entries.get(file).or_else(|| {
            let canonical = file.canonicalize().ok()?;
            self.entries.get(&canonical).or_else(|| {
                self.entries.iter().find(|(path, _)| path.canonicalize().is_ok_and(|p| p == canonical)).map(|(_, f)| f)
            })
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Nearest `compile_commands.json` in `start`'s ancestors or their `build/`.
pub(crate) fn find_compile_database(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() {
        start
    } else {
        start.parent()?
    };
    loop {
        for candidate in [dir.join(COMPILE_DATABASE_FILENAME), dir.join("build").join(COMPILE_DATABASE_FILENAME)] {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        dir = dir.parent()?;
    }
}

/// Split a shell command line into words, honoring quotes and escapes.
pub(crate) fn split_command(command: &str) -> Vec<String> {
    SHELL_WORD.find_iter(command).map(|word| unquote(word.as_str())).collect()
}

fn unquote(word: &str) -> String {
    let mut output = String::with_capacity(word.len());
    let mut quote = None;
    let mut chars = word.chars();
    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(open), _) if ch == open => quote = None,
            (Some('\''), _) => output.push(ch),
            (_, '\\') => {
                if let Some(escaped) = chars.next() {
                    output.push(escaped);
                }
            },
            _ => output.push(ch),
        }
    }
    output
}

/// Drop everything that would make Clang do more than parse the file: the
/// compiler itself, output and dependency-file options and the source path.
fn sanitize_arguments(
    argv: &[String],
    written_file: &Path,
    absolute_file: &Path,
) -> Vec<String> {
    let mut args = Vec::with_capacity(argv.len());
    let mut iter = argv.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "-MD" | "-MMD" | "-M" | "-MM" | "-MP" | "--" => {},
            "-o" | "-MF" | "-MT" | "-MQ" => {
                iter.next();
            },
            _ if arg.starts_with("-o") && arg.len() > 2 => {},
            _ if Path::new(arg) == written_file || Path::new(arg) == absolute_file => {},
            _ => args.push(arg.clone()),
        }
    }
    args
}

#[cfg(test)]
#[path = "../../tests/src/flags/compile_database_tests.rs"]
mod tests;
