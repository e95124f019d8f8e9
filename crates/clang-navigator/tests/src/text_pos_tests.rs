use super::*;

#[test]
fn ascii_columns_shift_by_one() {
    let source = "int x;\n  return x;\n";
    assert_eq!(source_position_from_lsp(source, Position::new(1, 9)), Some(SourcePosition::new(2, 10)));
    assert_eq!(lsp_position_from_source(Some(source), SourcePosition::new(2, 10)), Position::new(1, 9));
}

#[test]
fn utf16_columns_become_byte_columns() {
    // "é" is two bytes but one UTF-16 unit; "😀" is four bytes and two units.
    let source = "auto s = \"é😀\"; int y;";
    let y_utf16 = 20;
    let y_byte = source.find("y;").expect("y present") as u32;

    let position = source_position_from_lsp(source, Position::new(0, y_utf16)).expect("line exists");
    assert_eq!(position, SourcePosition::new(1, y_byte + 1));
    assert_eq!(lsp_position_from_source(Some(source), position), Position::new(0, y_utf16));
}

#[test]
fn crlf_line_endings_are_ignored() {
    let source = "int a;\r\nint b;\r\n";
    assert_eq!(source_position_from_lsp(source, Position::new(1, 4)), Some(SourcePosition::new(2, 5)));
    assert_eq!(lsp_position_from_source(Some(source), SourcePosition::new(2, 100)), Position::new(1, 6));
}

#[test]
fn positions_past_the_line_end_are_clamped() {
    assert_eq!(source_position_from_lsp("ab", Position::new(0, 10)), Some(SourcePosition::new(1, 3)));
    assert_eq!(source_position_from_lsp("ab", Position::new(3, 0)), None);
}

#[test]
fn missing_text_passes_byte_columns_through() {
    assert_eq!(lsp_position_from_source(None, SourcePosition::new(6, 12)), Position::new(5, 11));
}
