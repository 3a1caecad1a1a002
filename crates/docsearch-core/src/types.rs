//! Domain types shared by the indexer, the engine client and the search
//! orchestrator.

use serde::{Deserialize, Serialize};

/// One stored record per source file.
///
/// - `filename`: source file name, as found in the documents directory
/// - `content`: the full extracted text
/// - `embedding`: document vector, length fixed by the embedding model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    pub filename: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Schema parameters for a document index. The text fields are fixed;
/// only the vector dimensionality varies with the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSchema {
    pub dims: usize,
}

impl IndexSchema {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

/// A hit as returned by the engine, before it leaves the orchestrator.
///
/// `index` is taken from the response envelope, not from the stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineHit {
    pub index: String,
    pub score: f32,
    pub filename: String,
    pub content: String,
}

/// A ranked result. `source_index` names the index (and therefore the
/// document) the hit came from; higher `score` is always better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub score: f32,
    pub source_index: String,
    pub filename: String,
    pub content: String,
}

impl SearchHit {
    pub fn from_engine(hit: EngineHit) -> Self {
        Self { score: hit.score, source_index: hit.index, filename: hit.filename, content: hit.content }
    }
}

/// Engine-independent description of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineQuery {
    /// `should` combination of a lexical match, a phrase match and a
    /// cosine script score shifted by +1.
    Hybrid {
        text: String,
        vector: Vec<f32>,
        lexical_weight: f32,
        phrase_weight: f32,
    },
    /// Cosine script score shifted by +1 over every document.
    Semantic { vector: Vec<f32> },
    /// Plain full-text match on `content`.
    Lexical { text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: EngineQuery,
    pub size: usize,
}

/// Sort hits by descending score. Stable, so engine order breaks ties.
pub fn sort_by_score(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
}
