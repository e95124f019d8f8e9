use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::{flags::CompileFlags, translation_unit::TranslationUnitError};

static NEXT_AST_DUMP_ID: AtomicU64 = AtomicU64::new(1);

/// Everything needed to produce a translation unit for one file.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// Absolute path of the document.
    pub file: PathBuf,
    /// Unsaved editor contents; `None` compiles the file on disk.
    pub contents: Option<String>,
    pub flags: CompileFlags,
    /// Clang executable, resolved through `PATH` when not absolute.
    pub clang_path: String,
}

impl ParseRequest {
    pub fn new(
        file: impl Into<PathBuf>,
        flags: CompileFlags,
        clang_path: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            contents: None,
            flags,
            clang_path: clang_path.into(),
        }
    }

    pub fn with_contents(
        mut self,
        contents: impl Into<String>,
    ) -> Self {
        self.contents = Some(contents.into());
        self
    }
}

pub(crate) struct AstDump {
    pub(crate) json: String,
    /// Paths under which Clang saw the compiled file when it was a temporary copy.
    pub(crate) temp_files: Vec<PathBuf>,
}

fn clang_command(
    clang_path: &str,
    args: &[String],
) -> Command {
    let mut command = Command::new(clang_path);
    command.kill_on_drop(true).args(args);
    command
}

fn ast_dump_args(
    source_file: &Path,
    original_file: &Path,
    flags: &CompileFlags,
) -> Vec<String> {
    let mut args = vec![
        "-fsyntax-only".to_string(),
        "-fno-color-diagnostics".to_string(),
        "-Xclang".to_string(),
        "-ast-dump=json".to_string(),
    ];
    args.extend(flags.args.iter().cloned());

    // Quote includes of a temporary copy must still resolve beside the real file.
    if source_file != original_file
        && let Some(parent) = original_file.parent()
    {
        args.push("-iquote".to_string());
        args.push(parent.display().to_string());
    }

    args.push(source_file.display().to_string());
    args
}

/// Run Clang's JSON AST dump for the request and return the raw JSON.
pub(crate) async fn run_ast_dump(request: &ParseRequest) -> Result<AstDump, TranslationUnitError> {
    let mut temp_dir = None;
    let source_file = match &request.contents {
        Some(contents) => {
            let dir = std::env::temp_dir().join(format!("clang-navigator-{}", std::process::id()));
            tokio::fs::create_dir_all(&dir).await.map_err(|error| TranslationUnitError::Io {
                path: dir.clone(),
                reason: error.to_string(),
            })?;

            // Keep the extension so Clang picks the same language as for the real file.
            let dump_id = NEXT_AST_DUMP_ID.fetch_add(1, Ordering::Relaxed);
            let file_name = match request.file.extension() {
                Some(ext) => format!("unit-{dump_id}.{}", ext.to_string_lossy()),
                None => format!("unit-{dump_id}"),
            };
            let path = dir.join(file_name);

            let content = match request.file.parent() {
                Some(parent) => rewrite_includes(contents, parent).await,
                None => contents.clone(),
            };
            tokio::fs::write(&path, content).await.map_err(|error| TranslationUnitError::Io {
                path: path.clone(),
                reason: error.to_string(),
            })?;
            temp_dir = Some(dir);
            path
        },
        None => request.file.clone(),
    };

    let args = ast_dump_args(&source_file, &request.file, &request.flags);
    debug!("AST dump: {} {}", request.clang_path, args.join(" "));

    let mut command = clang_command(&request.clang_path, &args);
    if let Some(dir) = &request.flags.working_dir {
        command.current_dir(dir);
    }
    let output = command.output().await;

    let mut temp_files = Vec::new();
    if temp_dir.is_some() {
        temp_files.push(source_file.clone());
        if let Ok(canonical) = tokio::fs::canonicalize(&source_file).await
            && canonical != source_file
        {
            temp_files.push(canonical);
        }
        let _ = tokio::fs::remove_file(&source_file).await;
    }
    if let Some(dir) = temp_dir {
        // Fails harmlessly while another dump still owns a file in there.
        let _ = tokio::fs::remove_dir(&dir).await;
    }

    let output = output.map_err(|error| TranslationUnitError::CompilerLaunch {
        command: request.clang_path.clone(),
        reason: error.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|line| line.contains("error:")) {
            warn!("[ast-dump] compiler error: {line}");
        }
        debug!("[ast-dump] exited with {} (partial AST may still be usable)", output.status);
    }

    let json = String::from_utf8_lossy(&output.stdout).into_owned();
    if !json.trim_start().starts_with('{') {
        return Err(TranslationUnitError::EmptyOutput {
            file: request.file.clone(),
        });
    }

    debug!("[ast-dump] produced {} bytes of JSON for {}", json.len(), request.file.display());
    Ok(AstDump {
        json,
        temp_files,
    })
}

/// Make relative quote includes absolute when they exist beside `base_dir`.
///
/// Includes that do not resolve locally stay untouched so include paths can
/// still find them.
async fn rewrite_includes(
    source: &str,
    base_dir: &Path,
) -> String {
    let mut output = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("#include")
            && let Some(start) = line.find('"')
            && let Some(end) = line[start + 1..].find('"')
        {
            let rel_path = &line[start + 1..start + 1 + end];
            if !Path::new(rel_path).is_absolute() {
                let abs_path = base_dir.join(rel_path);
                if tokio::fs::try_exists(&abs_path).await.unwrap_or(false) {
                    output.push_str(&line[..start + 1]);
                    output.push_str(&abs_path.display().to_string());
                    output.push_str(&line[start + 1 + end..]);
                    output.push('\n');
                    continue;
                }
            }
        }
        output.push_str(line);
        output.push('\n');
    }
    output
}

#[cfg(test)]
#[path = "../../tests/src/translation_unit/compiler_tests.rs"]
mod tests;
