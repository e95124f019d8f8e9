use super::*;

const SAMPLE_AST: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.ast.json"));

fn loader() -> UnitLoader {
    UnitLoader::new(
        Arc::new(DocumentStore::new()),
        Arc::new(FlagsProvider::new()),
        Arc::new(RwLock::new(Settings::default())),
    )
}

fn sample_unit() -> Arc<TranslationUnit> {
    Arc::new(TranslationUnit::from_json(SAMPLE_AST, "/work/sample.cpp").expect("fixture AST parses"))
}

#[test]
fn cached_units_are_keyed_by_version() {
    let loader = loader();
    let uri = Url::parse("file:///work/sample.cpp").unwrap();
    loader.store(&uri, 3, sample_unit());

    assert!(loader.cached(&uri, 3).is_some());
    assert!(loader.cached(&uri, 4).is_none());

    loader.invalidate(&uri);
    assert!(loader.cached(&uri, 3).is_none());
}

#[test]
fn invalidate_releases_idle_build_locks() {
    let loader = loader();
    let uri = Url::parse("file:///work/sample.cpp").unwrap();
    drop(loader.build_lock(&uri));
    assert_eq!(loader.build_locks.len(), 1);

    loader.invalidate(&uri);
    assert_eq!(loader.build_locks.len(), 0);
}

#[test]
fn invalidate_keeps_build_locks_that_are_in_use() {
    let loader = loader();
    let uri = Url::parse("file:///work/sample.cpp").unwrap();
    let held = loader.build_lock(&uri);

    loader.invalidate(&uri);
    assert_eq!(loader.build_locks.len(), 1);
    assert!(Arc::ptr_eq(&held, &loader.build_lock(&uri)), "waiters must share the lock of the build in flight");

    drop(held);
    loader.invalidate(&uri);
    assert!(loader.build_locks.is_empty());
}

#[tokio::test]
async fn parse_request_carries_fallback_flags_and_buffer_text() {
    let loader = loader();
    let uri = Url::parse("file:///nonexistent/clang-navigator/main.c").unwrap();
    let document = Document::new(uri.clone(), "int main(void) { return 0; }\n".to_string(), 1);

    let path = uri.to_file_path().unwrap();
    let request = loader.parse_request(path.clone(), &document).await.expect("request resolves");
    assert_eq!(request.file, path);
    assert_eq!(request.flags.args, vec!["-x", "c"]);
    assert_eq!(request.clang_path, Settings::default().compiler.clang_path);
    assert_eq!(request.contents.as_deref(), Some(document.text.as_str()));
}
