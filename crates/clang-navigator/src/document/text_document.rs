use tower_lsp::lsp_types::{Position, Range, Url};

use crate::{
    cursor::{SourceExtent, SourcePosition},
    text_pos::{lsp_position_from_source, source_position_from_lsp},
};

/// One open buffer as last sent by the client.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub text: String,
    /// Client version; translation units are cached per version.
    pub version: i32,
}

impl Document {
    pub fn new(
        uri: Url,
        text: String,
        version: i32,
    ) -> Self {
        Self {
            uri,
            text,
            version,
        }
    }

    pub fn set_content(
        &mut self,
        text: String,
        version: i32,
    ) {
        (self.text, self.version) = (text, version);
    }

    /// Clang position of an LSP position in this buffer.
    pub fn source_position(
        &self,
        position: Position,
    ) -> Option<SourcePosition> {
        source_position_from_lsp(&self.text, position)
    }

    /// LSP range of a Clang extent in this buffer.
    pub fn lsp_range(
        &self,
        extent: SourceExtent,
    ) -> Range {
        let text = Some(self.text.as_str());
        Range::new(lsp_position_from_source(text, extent.start), lsp_position_from_source(text, extent.end))
    }
}
