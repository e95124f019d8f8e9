use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::{LogLevel, Settings},
    paths::short_name,
    server::{navigation::type_hint, state::ClangNavigatorServer},
};

/// Drops every cached translation unit and compilation database, so the
/// next request re-reads flags and headers from disk.
pub const CLEAN_AND_REBUILD_COMMAND: &str = "clang-navigator.cleanAndRebuild";

const CLIENT_NOTIFICATION_PREFIX: &str = "clang-navigator:";

#[tower_lsp::async_trait]
impl LanguageServer for ClangNavigatorServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing clang-navigator...");

        let initial_settings = Settings::from_lsp_payload(params.initialization_options.as_ref());
        self.apply_settings(initial_settings).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![CLEAN_AND_REBUILD_COMMAND.to_string()],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "clang-navigator".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("clang-navigator initialized");
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings);
        if merged == current {
            return;
        }
        self.apply_settings(merged).await;
        info!("Applied updated clang-navigator settings");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down clang-navigator");
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;
        let filename = short_name(std::path::Path::new(uri.path()));

        info!("Opened {filename} (v{version}, {} bytes)", text.len());
        self.log_to_client(LogLevel::Info, format!("Opened {filename}")).await;

        self.document_store.open(uri.clone(), text, version);

        // Parse ahead of the first request so the editor is not kept waiting.
        let units = self.units.clone();
        tokio::spawn(async move {
            units.load(&uri).await;
        });
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        // Full sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        if self.document_store.update(uri.clone(), change.text, version) {
            self.units.invalidate(&uri);
        }
    }

    async fn did_save(
        &self,
        params: DidSaveTextDocumentParams,
    ) {
        // Headers may have been saved alongside; reparse on next request.
        self.units.invalidate(&params.text_document.uri);
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        self.document_store.close(&uri);
        self.units.invalidate(&uri);
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let start = std::time::Instant::now();
        let Some((_, declaration)) = self.declaration_at(&uri, position).await else {
            debug!("goto-def {}:{}:{} → none", uri.path(), position.line + 1, position.character + 1);
            return Ok(None);
        };
        let location = self.declaration_to_lsp(&declaration).await;
        debug!(
            "goto-def {}:{}:{} → {}:{} ({:?})",
            uri.path(),
            position.line + 1,
            position.character + 1,
            declaration.file.display(),
            declaration.line,
            start.elapsed(),
        );
        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn hover(
        &self,
        params: HoverParams,
    ) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some((document, declaration)) = self.declaration_at(&uri, position).await else {
            return Ok(None);
        };
        let Ok(path) = uri.to_file_path() else {
            return Ok(None);
        };
        Ok(type_hint(&document, &path, &declaration))
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<Value>> {
        if params.command != CLEAN_AND_REBUILD_COMMAND {
            warn!("Unknown command {}", params.command);
            return Ok(None);
        }
        self.units.clear();
        info!("Cleared cached translation units and compile flags");
        self.log_to_client(LogLevel::Info, "Cleared cached translation units and compile flags").await;
        Ok(None)
    }
}

impl ClangNavigatorServer {
    async fn log_to_client(
        &self,
        severity: LogLevel,
        message: impl AsRef<str>,
    ) {
        if !self.settings_snapshot().await.logging.level.allows(severity) {
            return;
        }
        let message = prefixed_client_message(message);
        // The client may already be gone during shutdown.
        let _ = AssertUnwindSafe(self.client.log_message(severity.message_type(), message)).catch_unwind().await;
    }
}

fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}
