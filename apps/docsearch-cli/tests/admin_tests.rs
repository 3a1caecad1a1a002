use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use docsearch_cli::admin::{router, StatusBody};
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::{DocumentRecord, EngineHit, IndexSchema, SearchRequest};
use docsearch_core::{Error, Result};
use tower::ServiceExt;

/// Index names only; deleting `broken` fails like an engine error.
#[derive(Default)]
struct IndexSet {
    names: Mutex<BTreeSet<String>>,
}

impl IndexSet {
    fn with(names: &[&str]) -> Arc<Self> {
        let set = Self::default();
        set.names.lock().unwrap().extend(names.iter().map(|n| n.to_string()));
        Arc::new(set)
    }
}

impl SearchBackend for IndexSet {
    fn ping(&self) -> Result<()> { Ok(()) }
    fn index_exists(&self, name: &str) -> Result<bool> { Ok(self.names.lock().unwrap().contains(name)) }
    fn create_index(&self, name: &str, _schema: &IndexSchema) -> Result<()> {
        self.names.lock().unwrap().insert(name.to_string());
        Ok(())
    }
    fn delete_index(&self, name: &str) -> Result<()> {
        if name == "broken" {
            return Err(Error::engine("delete_index", Some(500), "cluster unavailable"));
        }
        self.names.lock().unwrap().remove(name);
        Ok(())
    }
    fn list_indices(&self) -> Result<Vec<String>> { Ok(self.names.lock().unwrap().iter().cloned().collect()) }
    fn index_document(&self, _index: &str, _record: &DocumentRecord) -> Result<String> { Ok("1".into()) }
    fn count_documents(&self, _index: &str) -> Result<u64> { Ok(0) }
    fn search(&self, _indices: &[String], _request: &SearchRequest) -> Result<Vec<EngineHit>> { Ok(Vec::new()) }
}

async fn call(backend: Arc<IndexSet>, uri: &str) -> (StatusCode, StatusBody) {
    let response = router(backend)
        .oneshot(Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn missing_filename_is_bad_request() {
    let (status, body) = call(IndexSet::with(&[]), "/delete-index").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.status, "error");

    let (status, _) = call(IndexSet::with(&[]), "/delete-index?filename=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn existing_index_is_deleted() {
    let backend = IndexSet::with(&["manual", "notes"]);
    let (status, body) = call(Arc::clone(&backend), "/delete-index?filename=Manual.pdf").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "success");
    assert_eq!(backend.list_indices().unwrap(), ["notes"]);
}

#[tokio::test]
async fn unknown_index_is_not_found() {
    let (status, body) = call(IndexSet::with(&["notes"]), "/delete-index?filename=ghost.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.message.contains("ghost"));
}

#[tokio::test]
async fn invalid_name_is_bad_request() {
    let (status, _) = call(IndexSet::with(&[]), "/delete-index?filename=my%20file.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn engine_failure_is_internal_error() {
    let (status, body) = call(IndexSet::with(&["broken"]), "/delete-index?filename=broken.docx").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.status, "error");
}
