//! Renders engine-independent queries into the engine's query DSL.

use docsearch_core::types::{EngineQuery, SearchRequest};
use serde_json::{json, Value};

use crate::schema::{CONTENT_FIELD, EMBEDDING_FIELD, FILENAME_FIELD};

/// Cosine similarity against the stored vector, shifted into `[0, 2]` so
/// scores stay non-negative.
pub fn cosine_script() -> String {
    format!("cosineSimilarity(params.query_vector, '{EMBEDDING_FIELD}') + 1.0")
}

fn semantic_clause(vector: &[f32]) -> Value {
    json!({
        "script_score": {
            "query": { "match_all": {} },
            "script": {
                "source": cosine_script(),
                "params": { "query_vector": vector }
            }
        }
    })
}

fn render_query(query: &EngineQuery) -> Value {
    match query {
        EngineQuery::Hybrid { text, vector, lexical_weight, phrase_weight } => json!({
            "bool": {
                "should": [
                    { "match": { CONTENT_FIELD: { "query": text, "boost": lexical_weight } } },
                    { "match_phrase": { CONTENT_FIELD: { "query": text, "boost": phrase_weight } } },
                    semantic_clause(vector)
                ]
            }
        }),
        EngineQuery::Semantic { vector } => semantic_clause(vector),
        EngineQuery::Lexical { text } => json!({ "match": { CONTENT_FIELD: { "query": text } } }),
    }
}

/// Full `_search` body. Only the stored text fields are returned; the
/// vector stays on the server.
pub fn render(request: &SearchRequest) -> Value {
    json!({
        "size": request.size,
        "query": render_query(&request.query),
        "_source": [FILENAME_FIELD, CONTENT_FIELD]
    })
}
