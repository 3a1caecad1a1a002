#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use docsearch_core::config::SearchSettings;
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::{DocumentRecord, EngineHit, EngineQuery, IndexSchema, SearchRequest};
use docsearch_core::{Error, Result};
use docsearch_embed::{DocumentEmbedder, FakeEmbedder};
use docsearch_hybrid::HybridSearchEngine;

pub const DIM: usize = 32;

pub fn engine<B: SearchBackend>(backend: B, settings: SearchSettings) -> HybridSearchEngine<B> {
    let embedder = DocumentEmbedder::with_limits(Box::new(FakeEmbedder::new(DIM)), 4000, 2000);
    HybridSearchEngine::new(backend, embedder, settings).with_progress(false)
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

/// Keeps indices in memory and scores them the way the engine's query DSL
/// would: lexical and phrase clauses add their boost, the script clause adds
/// `cosine + 1` to every document.
#[derive(Default)]
pub struct MemoryBackend {
    indices: Mutex<BTreeMap<String, Vec<(String, DocumentRecord)>>>,
    next_id: Mutex<u64>,
}

impl MemoryBackend {
    pub fn with_system_index(name: &str) -> Self {
        let backend = Self::default();
        backend.indices.lock().unwrap().insert(name.to_string(), Vec::new());
        backend
    }

    pub fn documents(&self, index: &str) -> Vec<DocumentRecord> {
        self.indices.lock().unwrap().get(index).map(|docs| docs.iter().map(|(_, d)| d.clone()).collect()).unwrap_or_default()
    }
}

fn score(query: &EngineQuery, doc: &DocumentRecord) -> Option<f32> {
    let content = doc.content.to_lowercase();
    let lexical = |text: &str| text.split_whitespace().any(|t| content.contains(&t.to_lowercase()));
    match query {
        EngineQuery::Hybrid { text, vector, lexical_weight, phrase_weight } => {
            let mut s = cosine(vector, &doc.embedding) + 1.0;
            if lexical(text) {
                s += lexical_weight;
            }
            if content.contains(&text.to_lowercase()) {
                s += phrase_weight;
            }
            Some(s)
        }
        EngineQuery::Semantic { vector } => Some(cosine(vector, &doc.embedding) + 1.0),
        EngineQuery::Lexical { text } => lexical(text).then_some(1.0),
    }
}

impl SearchBackend for MemoryBackend {
    fn ping(&self) -> Result<()> { Ok(()) }

    fn index_exists(&self, name: &str) -> Result<bool> {
        Ok(self.indices.lock().unwrap().contains_key(name))
    }

    fn create_index(&self, name: &str, _schema: &IndexSchema) -> Result<()> {
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(name) {
            return Err(Error::engine("create_index", Some(400), format!("index [{name}] already exists")));
        }
        indices.insert(name.to_string(), Vec::new());
        Ok(())
    }

    fn delete_index(&self, name: &str) -> Result<()> {
        self.indices.lock().unwrap().remove(name).map(|_| ()).ok_or_else(|| Error::IndexNotFound(name.to_string()))
    }

    fn list_indices(&self) -> Result<Vec<String>> {
        Ok(self.indices.lock().unwrap().keys().cloned().collect())
    }

    fn index_document(&self, index: &str, record: &DocumentRecord) -> Result<String> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("doc-{}", *next);
        let mut indices = self.indices.lock().unwrap();
        let docs = indices.get_mut(index).ok_or_else(|| Error::IndexNotFound(index.to_string()))?;
        docs.push((id.clone(), record.clone()));
        Ok(id)
    }

    fn count_documents(&self, index: &str) -> Result<u64> {
        let indices = self.indices.lock().unwrap();
        indices.get(index).map(|docs| docs.len() as u64).ok_or_else(|| Error::IndexNotFound(index.to_string()))
    }

    fn search(&self, indices: &[String], request: &SearchRequest) -> Result<Vec<EngineHit>> {
        let stored = self.indices.lock().unwrap();
        let mut hits = Vec::new();
        for name in indices {
            let docs = stored.get(name).ok_or_else(|| Error::IndexNotFound(name.clone()))?;
            for (_, doc) in docs {
                if let Some(score) = score(&request.query, doc) {
                    hits.push(EngineHit {
                        index: name.clone(),
                        score,
                        filename: doc.filename.clone(),
                        content: doc.content.clone(),
                    });
                }
            }
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(request.size);
        Ok(hits)
    }
}

/// Returns canned hits per index and records which indices each search
/// request covered.
#[derive(Default)]
pub struct ScriptedBackend {
    indices: Vec<String>,
    hits: HashMap<String, Vec<EngineHit>>,
    failing: HashSet<String>,
    pub requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new(indices: &[&str]) -> Self {
        Self { indices: indices.iter().map(|s| s.to_string()).collect(), ..Default::default() }
    }

    pub fn with_hit(mut self, index: &str, filename: &str, score: f32) -> Self {
        self.hits.entry(index.to_string()).or_default().push(EngineHit {
            index: index.to_string(),
            score,
            filename: filename.to_string(),
            content: format!("content of {filename}"),
        });
        self
    }

    pub fn failing(mut self, index: &str) -> Self {
        self.failing.insert(index.to_string());
        self
    }

    pub fn searched(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

impl SearchBackend for ScriptedBackend {
    fn ping(&self) -> Result<()> { Ok(()) }
    fn index_exists(&self, name: &str) -> Result<bool> { Ok(self.indices.iter().any(|i| i == name)) }
    fn create_index(&self, _name: &str, _schema: &IndexSchema) -> Result<()> { Ok(()) }
    fn delete_index(&self, _name: &str) -> Result<()> { Ok(()) }
    fn list_indices(&self) -> Result<Vec<String>> { Ok(self.indices.clone()) }
    fn index_document(&self, _index: &str, _record: &DocumentRecord) -> Result<String> { Ok("scripted".into()) }
    fn count_documents(&self, index: &str) -> Result<u64> { Ok(self.hits.get(index).map_or(0, |h| h.len() as u64)) }

    fn search(&self, indices: &[String], request: &SearchRequest) -> Result<Vec<EngineHit>> {
        self.requests.lock().unwrap().push(indices.to_vec());
        if let Some(bad) = indices.iter().find(|i| self.failing.contains(*i)) {
            return Err(Error::engine("search", Some(500), format!("shard failure on [{bad}]")));
        }
        let mut hits: Vec<EngineHit> = indices.iter().flat_map(|i| self.hits.get(i).cloned().unwrap_or_default()).collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(request.size);
        Ok(hits)
    }
}
