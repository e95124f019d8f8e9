//! Resolve the declaration a source position refers to.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    cursor::{Cursor, SourceExtent},
    paths::short_name,
    translation_unit::TranslationUnit,
};

/// Where the symbol under the cursor is declared, plus what the cursor
/// itself spells and has as type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationLocation {
    /// File of the referenced declaration.
    pub file: PathBuf,
    /// 1-based line of the referenced declaration.
    pub line: u32,
    /// 1-based byte column of the referenced declaration.
    pub column: u32,
    /// Identifier text at the cursor.
    pub spelling: String,
    /// Type of the cursor, when Clang knows one.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// Range of the cursor itself.
    pub extent: SourceExtent,
}

/// Find the declaration referenced at `line:column` of `absolute_path`.
///
/// Declarations under the cursor are ignored, since what they declare is
/// already on screen. Variable declarations are the exception: their type is
/// often deduced (`auto`) and worth showing.
pub fn get_declaration_location_and_spelling(
    translation_unit: &TranslationUnit,
    absolute_path: &Path,
    line: u32,
    column: u32,
) -> Option<DeclarationLocation> {
    let log = |message: &str| {
        info!("{}:{line}:{column} - {message}", short_name(absolute_path));
    };

    let location = translation_unit.get_location(absolute_path, line, column);
    let Some(cursor) = Cursor::from_location(translation_unit, &location) else {
        log("No cursor");
        return None;
    };

    let kind = cursor.kind();
    if !kind.is_var_decl() && kind.is_declaration() {
        log("Ignoring declaration");
        return None;
    }

    let referenced = cursor.referenced();
    let Some(declared_at) = referenced.as_ref().and_then(|decl| decl.location.as_ref()) else {
        log("No referenced information");
        return None;
    };
    let Some(extent) = cursor.extent() else {
        log("No referenced information");
        return None;
    };

    log(&format!("Returning {}:{}:{}", short_name(&declared_at.file), declared_at.line, declared_at.column));

    let ty = match cursor.type_spelling() {
        Ok(ty) => Some(ty.to_owned()),
        Err(error) => {
            warn!("Was not able to get cursor type: {error}");
            None
        },
    };

    Some(DeclarationLocation {
        file: declared_at.file.clone(),
        line: declared_at.line,
        column: declared_at.column,
        spelling: cursor.spelling().into_owned(),
        ty,
        extent,
    })
}

#[cfg(test)]
#[path = "../../tests/src/declaration/declaration_tests.rs"]
mod tests;
