use std::sync::Arc;

use crate::error::Result;
use crate::types::{DocumentRecord, EngineHit, IndexSchema, SearchRequest};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Index-level CRUD plus querying against the search engine.
pub trait SearchBackend: Send + Sync {
    fn ping(&self) -> Result<()>;
    fn index_exists(&self, name: &str) -> Result<bool>;
    fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()>;
    fn delete_index(&self, name: &str) -> Result<()>;
    /// Every index name the engine knows about, system indices included.
    fn list_indices(&self) -> Result<Vec<String>>;
    /// Stores `record` and returns the engine-assigned document id.
    fn index_document(&self, index: &str, record: &DocumentRecord) -> Result<String>;
    fn count_documents(&self, index: &str) -> Result<u64>;
    /// Runs one request spanning all of `indices`, ranked by the engine.
    fn search(&self, indices: &[String], request: &SearchRequest) -> Result<Vec<EngineHit>>;
}

macro_rules! forward_backend {
    ($($ptr:ty),*) => {$(
        impl<T: SearchBackend + ?Sized> SearchBackend for $ptr {
            fn ping(&self) -> Result<()> { (**self).ping() }
            fn index_exists(&self, name: &str) -> Result<bool> { (**self).index_exists(name) }
            fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()> { (**self).create_index(name, schema) }
            fn delete_index(&self, name: &str) -> Result<()> { (**self).delete_index(name) }
            fn list_indices(&self) -> Result<Vec<String>> { (**self).list_indices() }
            fn index_document(&self, index: &str, record: &DocumentRecord) -> Result<String> { (**self).index_document(index, record) }
            fn count_documents(&self, index: &str) -> Result<u64> { (**self).count_documents(index) }
            fn search(&self, indices: &[String], request: &SearchRequest) -> Result<Vec<EngineHit>> { (**self).search(indices, request) }
        }
    )*};
}

forward_backend!(&T, Arc<T>);
