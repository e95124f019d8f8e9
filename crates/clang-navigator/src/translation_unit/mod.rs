//! Parsed Clang translation units.
//!
//! A [`TranslationUnit`] owns the deserialized JSON AST of one compiled file
//! together with an index of every declaration it describes, so cursors can
//! follow a reference to its declaration without another tree walk.

mod clang_nodes;
mod compiler;

use std::{
    collections::{HashMap, HashSet},
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use clang_ast::Id;
use serde::Serialize;
use tracing::debug;

pub use clang_nodes::{
    Clang, Node, QualType, ReferencedDecl, is_call_kind, is_declaration_kind, is_expression_kind, resolve_loc,
};
pub use compiler::ParseRequest;

use crate::{
    cursor::{CursorLocation, SourcePosition},
    paths::paths_match,
};

/// A concrete point in a file, as reported for a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

/// A declaration described somewhere in the translation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub id: Id,
    /// Clang node kind, e.g. `FunctionDecl`.
    pub kind: String,
    pub name: Option<String>,
    pub qual_type: Option<QualType>,
    /// `None` for declarations Clang only mentions inline (builtins,
    /// declarations filtered out of the dump).
    pub location: Option<FileLocation>,
}

impl Declaration {
    fn from_summary(summary: &ReferencedDecl) -> Self {
        Self {
            id: summary.id,
            kind: summary.kind.clone().unwrap_or_default(),
            name: summary.name.clone(),
            qual_type: summary.ty.clone(),
            location: None,
        }
    }
}

/// Where a translation unit came from, used to turn the paths Clang reports
/// back into paths the editor knows.
#[derive(Debug, Clone, Default)]
pub struct UnitOrigin {
    /// The real path of the document that was compiled.
    pub main_file: PathBuf,
    /// Directory Clang ran in; relative paths in the dump resolve against it.
    pub working_dir: Option<PathBuf>,
    /// Temporary copies of `main_file` that were handed to Clang instead.
    pub temp_files: Vec<PathBuf>,
}

impl UnitOrigin {
    pub fn new(main_file: impl Into<PathBuf>) -> Self {
        Self {
            main_file: main_file.into(),
            ..Self::default()
        }
    }

    fn resolve_file(
        &self,
        file: &str,
    ) -> PathBuf {
        let path = Path::new(file);
        if self.temp_files.iter().any(|tmp| tmp == path) {
            return self.main_file.clone();
        }
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

pub struct TranslationUnit {
    origin: UnitOrigin,
    root: Node,
    declarations: HashMap<Id, Declaration>,
    /// Ids of named, non-implicit declarations in document order.
    names: HashMap<String, Vec<Id>>,
    files: Vec<PathBuf>,
}

impl TranslationUnit {
    /// Build a translation unit from the output of `clang -Xclang -ast-dump=json`.
    pub fn from_json(
        json: &str,
        main_file: impl Into<PathBuf>,
    ) -> Result<Self, TranslationUnitError> {
        Self::from_json_with_origin(json, UnitOrigin::new(main_file))
    }

    pub fn from_json_with_origin(
        json: &str,
        origin: UnitOrigin,
    ) -> Result<Self, TranslationUnitError> {
        let root: Node = serde_json::from_str(json).map_err(TranslationUnitError::Json)?;
        Ok(Self::from_root(root, origin))
    }

    pub fn from_root(
        root: Node,
        origin: UnitOrigin,
    ) -> Self {
        let mut collector = Collector::default();
        collector.walk(&root, &origin);
        let Collector {
            declarations,
            names,
            files,
        } = collector;

        let files = files.into_iter().map(|file| origin.resolve_file(file)).collect::<Vec<_>>();
        debug!(
            "[translation-unit] {} declarations across {} files (main={})",
            declarations.len(),
            files.len(),
            origin.main_file.display(),
        );

        Self {
            declarations,
            names,
            files,
            origin,
            root,
        }
    }

    /// Run Clang on the requested file and build its translation unit.
    pub async fn parse(request: &ParseRequest) -> Result<Self, TranslationUnitError> {
        let dump = compiler::run_ast_dump(request).await?;
        let origin = UnitOrigin {
            main_file: request.file.clone(),
            working_dir: request.flags.working_dir.clone(),
            temp_files: dump.temp_files,
        };
        tokio::task::spawn_blocking(move || Self::from_json_with_origin(&dump.json, origin))
            .await
            .map_err(|error| TranslationUnitError::Interrupted(error.to_string()))?
    }

    pub fn main_file(&self) -> &Path {
        &self.origin.main_file
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Files that contributed at least one node, after path remapping.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains_file(
        &self,
        path: &Path,
    ) -> bool {
        self.files.iter().any(|file| paths_match(file, path))
    }

    pub fn declaration(
        &self,
        id: Id,
    ) -> Option<&Declaration> {
        self.declarations.get(&id)
    }

    /// The first declaration named `name` whose kind is one of `kinds`.
    pub fn find_declaration(
        &self,
        name: &str,
        kinds: &[&str],
    ) -> Option<&Declaration> {
        self.names
            .get(name)?
            .iter()
            .filter_map(|id| self.declarations.get(id))
            .find(|decl| kinds.contains(&decl.kind.as_str()))
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    /// A location inside this unit, in Clang's 1-based line and byte column.
    pub fn get_location(
        &self,
        path: &Path,
        line: u32,
        column: u32,
    ) -> CursorLocation {
        CursorLocation {
            file: path.to_path_buf(),
            position: SourcePosition::new(line, column),
        }
    }

    pub(crate) fn resolve_file(
        &self,
        file: &str,
    ) -> PathBuf {
        self.origin.resolve_file(file)
    }

    /// Resolve an inline reference summary against the declaration index.
    pub(crate) fn referenced_declaration(
        &self,
        summary: &ReferencedDecl,
    ) -> Declaration {
        self.declarations.get(&summary.id).cloned().unwrap_or_else(|| Declaration::from_summary(summary))
    }
}

#[derive(Default)]
struct Collector<'a> {
    declarations: HashMap<Id, Declaration>,
    names: HashMap<String, Vec<Id>>,
    files: HashSet<&'a str>,
}

impl<'a> Collector<'a> {
    fn walk(
        &mut self,
        node: &'a Node,
        origin: &UnitOrigin,
    ) {
        if let Some(range) = node.kind.range()
            && let Some(begin) = resolve_loc(&range.begin)
            && !begin.file.is_empty()
        {
            self.files.insert(&*begin.file);
        }

        match &node.kind {
            Clang::LabelStmt(label) => {
                if let Some(id) = label.decl_id {
                    let location = label
                        .range
                        .as_ref()
                        .and_then(|range| resolve_loc(&range.begin))
                        .and_then(|bare| file_location(bare, origin));
                    self.declarations.entry(id).or_insert_with(|| Declaration {
                        id,
                        kind: "LabelDecl".to_owned(),
                        name: label.name.clone(),
                        qual_type: None,
                        location,
                    });
                }
            },
            kind if is_declaration_kind(kind.kind_name()) => {
                if let Some(name) = kind.name()
                    && !kind.is_implicit()
                {
                    self.names.entry(name.to_owned()).or_default().push(node.id);
                }
                let location = kind.loc().and_then(resolve_loc).and_then(|bare| file_location(bare, origin));
                self.declarations.entry(node.id).or_insert_with(|| Declaration {
                    id: node.id,
                    kind: kind.kind_name().to_owned(),
                    name: kind.name().map(str::to_owned),
                    qual_type: kind.qual_type().cloned(),
                    location,
                });
            },
            _ => {},
        }

        for child in &node.inner {
            self.walk(child, origin);
        }
    }
}

fn file_location(
    bare: &clang_ast::BareSourceLocation,
    origin: &UnitOrigin,
) -> Option<FileLocation> {
    if bare.line == 0 || bare.file.is_empty() {
        return None;
    }
    Some(FileLocation {
        file: origin.resolve_file(&bare.file),
        line: bare.line as u32,
        column: bare.col as u32,
    })
}

#[derive(Debug)]
pub enum TranslationUnitError {
    Io {
        path: PathBuf,
        reason: String,
    },
    CompilerLaunch {
        command: String,
        reason: String,
    },
    EmptyOutput {
        file: PathBuf,
    },
    Json(serde_json::Error),
    Interrupted(String),
}

impl Display for TranslationUnitError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Io {
                path,
                reason,
            } => write!(f, "{}: {reason}", path.display()),
            Self::CompilerLaunch {
                command,
                reason,
            } => write!(f, "failed to launch {command}: {reason}"),
            Self::EmptyOutput {
                file,
            } => write!(f, "clang produced no AST for {}", file.display()),
            Self::Json(error) => write!(f, "malformed AST JSON: {error}"),
            Self::Interrupted(reason) => write!(f, "AST parsing was interrupted: {reason}"),
        }
    }
}

impl std::error::Error for TranslationUnitError {}

#[cfg(test)]
#[path = "../../tests/src/translation_unit/translation_unit_tests.rs"]
mod tests;
