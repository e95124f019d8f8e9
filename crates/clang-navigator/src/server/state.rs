use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::Client;

use crate::{config::Settings, document::DocumentStore, flags::FlagsProvider, server::units::UnitLoader};

/// The clang-navigator backend that implements the Language Server Protocol.
pub struct ClangNavigatorServer {
    /// The LSP client handle, used to send log messages back.
    pub(crate) client: Client,

    /// Thread-safe store of all open documents.
    pub(crate) document_store: Arc<DocumentStore>,

    /// Parses documents with Clang and caches the result per version.
    pub(crate) units: UnitLoader,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: Arc<RwLock<Settings>>,
}

impl ClangNavigatorServer {
    pub fn new(client: Client) -> Self {
        let document_store = Arc::new(DocumentStore::new());
        let flags_provider = Arc::new(FlagsProvider::new());
        let settings = Arc::new(RwLock::new(Settings::default()));
        let units = UnitLoader::new(Arc::clone(&document_store), flags_provider, Arc::clone(&settings));

        Self {
            client,
            document_store,
            units,
            settings,
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        settings: Settings,
    ) {
        let compiler_changed = {
            let mut current = self.settings.write().await;
            let changed = current.compiler != settings.compiler;
            *current = settings;
            changed
        };
        if compiler_changed {
            self.units.clear();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/server/state_tests.rs"]
mod tests;
