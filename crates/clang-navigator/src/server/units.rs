use std::{path::PathBuf, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::{
    config::Settings,
    document::{Document, DocumentStore},
    flags::FlagsProvider,
    translation_unit::{ParseRequest, TranslationUnit},
};

struct CachedUnit {
    version: i32,
    unit: Arc<TranslationUnit>,
}

/// Parses open documents on demand and keeps the result for the document
/// version it was built from.
#[derive(Clone)]
pub(crate) struct UnitLoader {
    document_store: Arc<DocumentStore>,
    flags_provider: Arc<FlagsProvider>,
    settings: Arc<RwLock<Settings>>,
    units: Arc<DashMap<Url, CachedUnit>>,
    build_locks: Arc<DashMap<Url, Arc<Mutex<()>>>>,
}

impl UnitLoader {
    pub(crate) fn new(
        document_store: Arc<DocumentStore>,
        flags_provider: Arc<FlagsProvider>,
        settings: Arc<RwLock<Settings>>,
    ) -> Self {
        Self {
            document_store,
            flags_provider,
            settings,
            units: Arc::new(DashMap::new()),
            build_locks: Arc::new(DashMap::new()),
        }
    }

    /// The current document and its translation unit, parsing if needed.
    pub(crate) async fn load(
        &self,
        uri: &Url,
    ) -> Option<(Document, Arc<TranslationUnit>)> {
        let document = self.document_store.get(uri)?;
        if let Some(unit) = self.cached(uri, document.version) {
            return Some((document, unit));
        }

        let build_lock = self.build_lock(uri);
        let _build_guard = build_lock.lock().await;

        // Another request may have finished the same build while we waited.
        let document = self.document_store.get(uri)?;
        if let Some(unit) = self.cached(uri, document.version) {
            return Some((document, unit));
        }

        let path = uri.to_file_path().ok()?;
        let request = self.parse_request(path, &document).await?;
        let start = std::time::Instant::now();
        match TranslationUnit::parse(&request).await {
            Ok(unit) => {
                debug!(
                    "[units] parsed {} v{} in {:?} ({} declarations)",
                    request.file.display(),
                    document.version,
                    start.elapsed(),
                    unit.declaration_count(),
                );
                let unit = Arc::new(unit);
                self.store(uri, document.version, Arc::clone(&unit));
                Some((document, unit))
            },
            Err(error) => {
                warn!("[units] {}: {error}", request.file.display());
                None
            },
        }
    }

    pub(crate) fn invalidate(
        &self,
        uri: &Url,
    ) {
        self.units.remove(uri);
        // A lock still held elsewhere belongs to a build in flight.
        self.build_locks.remove_if(uri, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Drop every cached unit and compilation database.
    pub(crate) fn clear(&self) {
        self.units.clear();
        self.flags_provider.clear();
    }

    pub(crate) fn cached(
        &self,
        uri: &Url,
        version: i32,
    ) -> Option<Arc<TranslationUnit>> {
        self.units.get(uri).filter(|entry| entry.version == version).map(|entry| Arc::clone(&entry.unit))
    }

    pub(crate) fn store(
        &self,
        uri: &Url,
        version: i32,
        unit: Arc<TranslationUnit>,
    ) {
        self.units.insert(uri.clone(), CachedUnit {
            version,
            unit,
        });
    }

    /// Project settings and compile flags for `path`.
    ///
    /// Both walk the file system, so they are resolved on the blocking pool.
    async fn parse_request(
        &self,
        path: PathBuf,
        document: &Document,
    ) -> Option<ParseRequest> {
        let settings = self.settings.read().await.clone();
        let flags_provider = Arc::clone(&self.flags_provider);
        let resolved = tokio::task::spawn_blocking(move || {
            let settings = settings.for_source_file(&path);
            let flags = flags_provider.flags_for(&path, &settings.compiler);
            ParseRequest::new(path, flags, settings.compiler.clang_path)
        })
        .await;
        match resolved {
            Ok(request) => Some(request.with_contents(document.text.clone())),
            Err(error) => {
                warn!("[units] resolving compile flags failed: {error}");
                None
            },
        }
    }

    fn build_lock(
        &self,
        uri: &Url,
    ) -> Arc<Mutex<()>> {
        self.build_locks.entry(uri.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

#[cfg(test)]
#[path = "../../tests/src/server/units_tests.rs"]
mod tests;
