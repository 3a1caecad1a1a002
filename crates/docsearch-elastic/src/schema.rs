use docsearch_core::types::IndexSchema;
use serde_json::{json, Value};

pub const FILENAME_FIELD: &str = "filename";
pub const CONTENT_FIELD: &str = "content";
pub const EMBEDDING_FIELD: &str = "embedding";

/// Body for `PUT /{index}`: two analyzed text fields and a cosine-indexed
/// dense vector.
pub fn index_body(schema: &IndexSchema) -> Value {
    json!({
        "mappings": {
            "properties": {
                FILENAME_FIELD: { "type": "text" },
                CONTENT_FIELD: { "type": "text" },
                EMBEDDING_FIELD: {
                    "type": "dense_vector",
                    "dims": schema.dims,
                    "index": true,
                    "similarity": "cosine"
                }
            }
        }
    })
}
