use tower_lsp::{LspService, lsp_types::Url};

use super::*;
use crate::{config::LogLevel, translation_unit::TranslationUnit};

const SAMPLE_AST: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample.ast.json"));

#[tokio::test]
async fn only_compiler_changes_drop_cached_units() {
    let (service, _socket) = LspService::new(ClangNavigatorServer::new);
    let server = service.inner();
    let uri = Url::parse("file:///work/sample.cpp").unwrap();
    let unit = TranslationUnit::from_json(SAMPLE_AST, "/work/sample.cpp").expect("fixture AST parses");
    server.units.store(&uri, 1, Arc::new(unit));

    let mut logging_only = server.settings_snapshot().await;
    logging_only.logging.level = LogLevel::Debug;
    server.apply_settings(logging_only.clone()).await;
    assert!(server.units.cached(&uri, 1).is_some());
    assert_eq!(server.settings_snapshot().await, logging_only);

    let mut new_compiler = logging_only;
    new_compiler.compiler.clang_path = "/opt/llvm/bin/clang".to_string();
    server.apply_settings(new_compiler.clone()).await;
    assert!(server.units.cached(&uri, 1).is_none());
    assert_eq!(server.settings_snapshot().await, new_compiler);
}

#[tokio::test]
async fn concurrent_updates_leave_one_of_the_applied_settings() {
    let (service, _socket) = LspService::new(ClangNavigatorServer::new);
    let server = service.inner();

    let candidates = (0..8)
        .map(|index| {
            let mut settings = Settings::default();
            settings.compiler.clang_path = format!("/opt/clang-{index}");
            settings
        })
        .collect::<Vec<_>>();
    futures::future::join_all(candidates.iter().cloned().map(|settings| server.apply_settings(settings))).await;

    let applied = server.settings_snapshot().await;
    assert!(candidates.contains(&applied));
}
