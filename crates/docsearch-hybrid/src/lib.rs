use docsearch_core::config::SearchSettings;
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::IndexSchema;
use docsearch_embed::DocumentEmbedder;

pub mod index_manager;
pub mod indexer;
pub mod normalize;
pub mod preview;
pub mod search;

pub use index_manager::{ensure_fresh_index, remove_index_for, user_indices, Removal};
pub use indexer::{IndexOutcome, IngestFailure, IngestReport};
pub use search::SearchOutcome;

/// Ties a search backend to the embedder that produces both document and
/// query vectors. Indexing lives in [`indexer`], querying in [`search`].
pub struct HybridSearchEngine<B: SearchBackend> {
    backend: B,
    embedder: DocumentEmbedder,
    settings: SearchSettings,
    show_progress: bool,
}

impl<B: SearchBackend> HybridSearchEngine<B> {
    pub fn new(backend: B, embedder: DocumentEmbedder, settings: SearchSettings) -> Self {
        Self { backend, embedder, settings, show_progress: true }
    }

    /// Draw an ingest progress bar on stderr (on by default).
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn schema(&self) -> IndexSchema {
        IndexSchema::new(self.embedder.dim())
    }
}
