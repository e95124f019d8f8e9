//! Conversions between LSP positions (0-based, UTF-16 columns) and Clang
//! positions (1-based, byte columns).

use tower_lsp::lsp_types::Position;

use crate::cursor::SourcePosition;

fn nth_line(
    source: &str,
    index: u32,
) -> Option<&str> {
    let line = source.split('\n').nth(index as usize)?;
    Some(line.trim_end_matches('\r'))
}

/// Walk `line` until `stop(utf16, byte)` holds, returning both offsets there.
/// Offsets never exceed the line.
fn walk_columns(
    line: &str,
    stop: impl Fn(u32, usize) -> bool,
) -> (u32, usize) {
    let mut utf16 = 0u32;
    let mut byte = 0usize;
    for ch in line.chars() {
        if stop(utf16, byte) {
            break;
        }
        utf16 += ch.len_utf16() as u32;
        byte += ch.len_utf8();
    }
    (utf16, byte)
}

pub fn source_position_from_lsp(
    source: &str,
    position: Position,
) -> Option<SourcePosition> {
    let line = nth_line(source, position.line)?;
    let (_, byte) = walk_columns(line, |utf16, _| utf16 >= position.character);
    Some(SourcePosition::new(position.line + 1, byte as u32 + 1))
}

/// The LSP position of a Clang position.
///
/// Without the file's text the byte column is passed through unchanged,
/// which is exact for ASCII lines.
pub fn lsp_position_from_source(
    source: Option<&str>,
    position: SourcePosition,
) -> Position {
    let line_index = position.line.saturating_sub(1);
    let byte = position.column.saturating_sub(1) as usize;
    let character = match source.and_then(|text| nth_line(text, line_index)) {
        Some(line) => walk_columns(line, |_, offset| offset >= byte).0,
        None => byte as u32,
    };
    Position::new(line_index, character)
}

#[cfg(test)]
#[path = "../tests/src/text_pos_tests.rs"]
mod tests;
