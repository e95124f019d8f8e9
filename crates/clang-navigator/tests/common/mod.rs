#![allow(dead_code)]

use std::path::PathBuf;

use clang_navigator::TranslationUnit;
use tower_lsp::lsp_types::Position;

/// Path Clang reported for `sample.cpp` when the saved AST dump was produced.
pub const SAMPLE_AST_FILE: &str = "/work/sample.cpp";

pub fn has_clang() -> bool {
    std::process::Command::new("clang").arg("--version").output().is_ok_and(|output| output.status.success())
}

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

pub fn read_fixture(relative_path: &str) -> String {
    std::fs::read_to_string(fixture_path(relative_path)).expect("fixture must exist")
}

pub fn sample_unit() -> TranslationUnit {
    TranslationUnit::from_json(&read_fixture("sample.ast.json"), SAMPLE_AST_FILE).expect("fixture AST parses")
}

/// A fresh directory holding a copy of `sample.cpp`.
pub fn sample_workspace(name: &str) -> (PathBuf, PathBuf) {
    let nonce = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).expect("valid clock").as_nanos();
    let root = std::env::temp_dir().join(format!("clang-navigator-{name}-{}-{nonce}", std::process::id()));
    std::fs::create_dir_all(&root).expect("workspace dir");
    let source = root.join("sample.cpp");
    std::fs::copy(fixture_path("sample.cpp"), &source).expect("copy sample");
    (root, source)
}

pub fn position_of(
    source: &str,
    needle: &str,
) -> Position {
    position_of_nth(source, needle, 0)
}

/// LSP position (UTF-16 column) of the `nth` occurrence of `needle`.
pub fn position_of_nth(
    source: &str,
    needle: &str,
    nth: usize,
) -> Position {
    let (offset, _) = source.match_indices(needle).nth(nth).unwrap_or_else(|| panic!("needle not found: {needle}"));
    let before = &source[..offset];
    let line = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map_or(0, |newline| newline + 1);
    let character = before[line_start..].encode_utf16().count() as u32;
    Position::new(line, character)
}
