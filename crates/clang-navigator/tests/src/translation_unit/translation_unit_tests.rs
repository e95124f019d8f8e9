use std::path::Path;

use super::*;

const SAMPLE_AST: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.ast.json"));
const SAMPLE_FILE: &str = "/work/sample.cpp";

fn sample_unit() -> TranslationUnit {
    TranslationUnit::from_json(SAMPLE_AST, SAMPLE_FILE).expect("fixture AST parses")
}

fn id(hex: &str) -> Id {
    serde_json::from_value(serde_json::Value::String(hex.to_owned())).expect("valid node id")
}

#[test]
fn indexes_every_declaration_with_its_location() {
    let unit = sample_unit();

    let scale = unit.declaration(id("0x3000")).expect("scale is indexed");
    assert_eq!(scale.kind, "FunctionDecl");
    assert_eq!(scale.name.as_deref(), Some("scale"));
    assert_eq!(
        scale.location,
        Some(FileLocation {
            file: PathBuf::from(SAMPLE_FILE),
            line: 6,
            column: 12,
        })
    );

    let field = unit.declaration(id("0x2010")).expect("field x is indexed");
    assert_eq!(field.kind, "FieldDecl");
    assert_eq!(field.qual_type.as_ref().and_then(QualType::spelling), Some("int"));
}

#[test]
fn builtin_declarations_have_no_location() {
    let unit = sample_unit();
    let builtin = unit.declaration(id("0x1010")).expect("implicit typedef is indexed");
    assert_eq!(builtin.name.as_deref(), Some("__int128_t"));
    assert!(builtin.location.is_none());
}

#[test]
fn labels_are_indexed_under_their_decl_id() {
    let unit = sample_unit();
    let label = unit.declaration(id("0x5100")).expect("label from LabelStmt");
    assert_eq!(label.kind, "LabelDecl");
    assert_eq!(label.name.as_deref(), Some("again"));
    let location = label.location.as_ref().expect("label location");
    assert_eq!((location.line, location.column), (17, 1));
}

#[test]
fn translation_unit_is_not_indexed_as_declaration() {
    let unit = sample_unit();
    assert!(unit.declaration(id("0x1000")).is_none());
}

#[test]
fn collects_files_that_contribute_nodes() {
    let unit = sample_unit();
    assert_eq!(unit.files(), &[PathBuf::from(SAMPLE_FILE)]);
    assert!(unit.contains_file(Path::new(SAMPLE_FILE)));
    assert!(!unit.contains_file(Path::new("/work/other.cpp")));
}

#[test]
fn get_location_keeps_file_and_position() {
    let unit = sample_unit();
    let location = unit.get_location(Path::new(SAMPLE_FILE), 12, 16);
    assert_eq!(location.file, PathBuf::from(SAMPLE_FILE));
    assert_eq!(location.position, SourcePosition::new(12, 16));
}

#[test]
fn referenced_declaration_prefers_the_index() {
    let unit = sample_unit();
    let summary = ReferencedDecl {
        id: id("0x3000"),
        kind: Some("FunctionDecl".to_owned()),
        name: Some("scale".to_owned()),
        ty: None,
    };
    let declaration = unit.referenced_declaration(&summary);
    assert_eq!(declaration.location.map(|loc| loc.line), Some(6));
}

#[test]
fn referenced_declaration_falls_back_to_the_summary() {
    let unit = sample_unit();
    let summary = ReferencedDecl {
        id: id("0xdead"),
        kind: Some("FunctionDecl".to_owned()),
        name: Some("__builtin_expect".to_owned()),
        ty: None,
    };
    let declaration = unit.referenced_declaration(&summary);
    assert_eq!(declaration.name.as_deref(), Some("__builtin_expect"));
    assert!(declaration.location.is_none());
}

#[test]
fn temp_copies_map_back_to_the_main_file() {
    let origin = UnitOrigin {
        main_file: PathBuf::from("/src/main.cpp"),
        working_dir: Some(PathBuf::from("/build")),
        temp_files: vec![PathBuf::from("/tmp/clang-navigator-1/unit-1.cpp")],
    };
    assert_eq!(origin.resolve_file("/tmp/clang-navigator-1/unit-1.cpp"), PathBuf::from("/src/main.cpp"));
    assert_eq!(origin.resolve_file("gen/config.h"), PathBuf::from("/build/gen/config.h"));
    assert_eq!(origin.resolve_file("/usr/include/stdio.h"), PathBuf::from("/usr/include/stdio.h"));
}

#[test]
fn rejects_malformed_json() {
    let error = TranslationUnit::from_json("{\"kind\": ", SAMPLE_FILE).err().expect("truncated JSON is rejected");
    assert!(matches!(error, TranslationUnitError::Json(_)));
    assert!(error.to_string().starts_with("malformed AST JSON"));
}
