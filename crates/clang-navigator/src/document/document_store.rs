use dashmap::{DashMap, mapref::entry::Entry};
use tower_lsp::lsp_types::Url;
use tracing::debug;

use super::Document;

/// Open editor buffers, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &self,
        uri: Url,
        text: String,
        version: i32,
    ) {
        self.documents.insert(uri.clone(), Document::new(uri, text, version));
    }

    /// Replace a buffer's text with a full-sync change.
    ///
    /// Changes older than the stored version are dropped and `false` is
    /// returned; unknown URIs are registered.
    pub fn update(
        &self,
        uri: Url,
        text: String,
        version: i32,
    ) -> bool {
        match self.documents.entry(uri) {
            Entry::Occupied(mut entry) => {
                let document = entry.get_mut();
                if version < document.version {
                    debug!("[documents] ignoring stale v{version} of {} (have v{})", document.uri, document.version);
                    return false;
                }
                document.set_content(text, version);
            },
            Entry::Vacant(entry) => {
                let uri = entry.key().clone();
                entry.insert(Document::new(uri, text, version));
            },
        }
        true
    }

    pub fn close(
        &self,
        uri: &Url,
    ) {
        self.documents.remove(uri);
    }

    /// The buffer text, for translating Clang byte columns in that file.
    pub fn get_content(
        &self,
        uri: &Url,
    ) -> Option<String> {
        self.documents.get(uri).map(|doc| doc.text.clone())
    }

    /// A snapshot of the buffer, text and version together.
    pub fn get(
        &self,
        uri: &Url,
    ) -> Option<Document> {
        self.documents.get(uri).map(|doc| doc.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/src/document/document_store_tests.rs"]
mod tests;
