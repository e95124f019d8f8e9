use std::path::PathBuf;

use tower_lsp::LspService;

use super::*;
use crate::cursor::SourceExtent;

const UNICODE_SOURCE: &str = "int a;\n/* \u{fc}n\u{ef}code */ int counter = 0;\n";

fn document(text: &str) -> Document {
    Document::new(Url::parse("file:///src/main.cpp").unwrap(), text.to_string(), 1)
}

fn declaration(ty: Option<&str>) -> DeclarationLocation {
    DeclarationLocation {
        file: PathBuf::from("/src/main.cpp"),
        line: 1,
        column: 5,
        spelling: "total".to_string(),
        ty: ty.map(str::to_string),
        extent: SourceExtent::new(SourcePosition::new(2, 8), SourcePosition::new(2, 13)),
    }
}

#[test]
fn extent_converts_to_an_lsp_range() {
    let extent = SourceExtent::new(SourcePosition::new(2, 12), SourcePosition::new(2, 17));
    let range = document("int total;\n  int é = total;\n").lsp_range(extent);
    assert_eq!(range, Range::new(Position::new(1, 10), Position::new(1, 15)));
}

#[test]
fn type_hint_is_a_code_block_in_the_file_language() {
    let doc = document("int total;\n  auto total = 1;\n");
    let hover = type_hint(&doc, Path::new("/src/main.cpp"), &declaration(Some("int"))).expect("typed cursor");
    let HoverContents::Markup(markup) = hover.contents else {
        panic!("expected markdown hover");
    };
    assert_eq!(markup.value, "```cpp\nint\n```");
    assert_eq!(hover.range, Some(Range::new(Position::new(1, 7), Position::new(1, 12))));

    let c_hover = type_hint(&doc, Path::new("/src/main.c"), &declaration(Some("int"))).expect("typed cursor");
    let HoverContents::Markup(markup) = c_hover.contents else {
        panic!("expected markdown hover");
    };
    assert!(markup.value.starts_with("```c\n"));
}

#[test]
fn untyped_cursor_has_no_hint() {
    let doc = document("again:\n  goto again;\n");
    assert!(type_hint(&doc, Path::new("/src/main.cpp"), &declaration(None)).is_none());
}

fn counter_declaration(file: PathBuf) -> DeclarationLocation {
    DeclarationLocation {
        file,
        line: 2,
        // Byte column of `counter`; the comment before it holds two 2-byte characters.
        column: 21,
        spelling: "counter".to_string(),
        ty: Some("int".to_string()),
        extent: SourceExtent::new(SourcePosition::new(2, 19), SourcePosition::new(2, 26)),
    }
}

#[tokio::test]
async fn target_range_uses_utf16_columns_of_the_open_buffer() {
    let (service, _socket) = LspService::new(ClangNavigatorServer::new);
    let server = service.inner();
    let uri = Url::parse("file:///src/unicode.cpp").unwrap();
    server.document_store.open(uri.clone(), UNICODE_SOURCE.to_string(), 1);

    let location = server
        .declaration_to_lsp(&counter_declaration(PathBuf::from("/src/unicode.cpp")))
        .await
        .expect("file path converts to a URI");
    assert_eq!(location.uri, uri);
    assert_eq!(location.range, Range::new(Position::new(1, 18), Position::new(1, 25)));
}

#[tokio::test]
async fn target_range_reads_closed_files_from_disk() {
    let nonce = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).expect("valid clock").as_nanos();
    let dir = std::env::temp_dir().join(format!("clang-navigator-navigation-{}-{nonce}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let file = dir.join("unicode.cpp");
    std::fs::write(&file, UNICODE_SOURCE).expect("write source");

    let (service, _socket) = LspService::new(ClangNavigatorServer::new);
    let location = service.inner().declaration_to_lsp(&counter_declaration(file.clone())).await.expect("location");
    assert_eq!(location.uri, Url::from_file_path(&file).unwrap());
    assert_eq!(location.range, Range::new(Position::new(1, 18), Position::new(1, 25)));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn unreadable_target_keeps_byte_columns() {
    let (service, _socket) = LspService::new(ClangNavigatorServer::new);
    let declaration = counter_declaration(PathBuf::from("/nonexistent/clang-navigator/unicode.cpp"));
    let location = service.inner().declaration_to_lsp(&declaration).await.expect("location");
    assert_eq!(location.range, Range::new(Position::new(1, 20), Position::new(1, 27)));
}
