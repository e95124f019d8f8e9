use std::path::Path;

use tower_lsp::lsp_types::{
    Hover, HoverContents, Location, MarkupContent, MarkupKind, Position, Range, Url,
};
use tracing::debug;

use crate::{
    cursor::SourcePosition,
    declaration::{DeclarationLocation, get_declaration_location_and_spelling},
    document::Document,
    flags::language_for,
    server::state::ClangNavigatorServer,
    text_pos::lsp_position_from_source,
};

impl ClangNavigatorServer {
    /// Run the declaration lookup for an LSP position in an open document.
    pub(crate) async fn declaration_at(
        &self,
        uri: &Url,
        position: Position,
    ) -> Option<(Document, DeclarationLocation)> {
        let (document, unit) = self.units.load(uri).await?;
        let source_position = document.source_position(position)?;
        let path = uri.to_file_path().ok()?;

        let declaration =
            get_declaration_location_and_spelling(&unit, &path, source_position.line, source_position.column)?;
        Some((document, declaration))
    }

    /// LSP location of the referenced declaration, covering its name.
    pub(crate) async fn declaration_to_lsp(
        &self,
        declaration: &DeclarationLocation,
    ) -> Option<Location> {
        let uri = Url::from_file_path(&declaration.file).ok()?;
        let text = match self.document_store.get_content(&uri) {
            Some(text) => Some(text),
            None => tokio::fs::read_to_string(&declaration.file).await.ok(),
        };
        if text.is_none() {
            debug!("{} is unreadable, using byte columns", declaration.file.display());
        }

        let start = lsp_position_from_source(
            text.as_deref(),
            SourcePosition::new(declaration.line, declaration.column),
        );
        let name_len = declaration.spelling.encode_utf16().count() as u32;
        let end = Position::new(start.line, start.character + name_len);
        Some(Location {
            uri,
            range: Range::new(start, end),
        })
    }
}

/// The type hint for a resolved cursor, shown as a code block.
pub(crate) fn type_hint(
    document: &Document,
    path: &Path,
    declaration: &DeclarationLocation,
) -> Option<Hover> {
    let ty = declaration.ty.as_deref()?;
    let fence = match language_for(path) {
        "c" => "c",
        "objective-c" | "objective-c++" => "objectivec",
        _ => "cpp",
    };
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: format!("```{fence}\n{ty}\n```"),
        }),
        range: Some(document.lsp_range(declaration.extent)),
    })
}

#[cfg(test)]
#[path = "../../tests/src/server/navigation_tests.rs"]
mod tests;
