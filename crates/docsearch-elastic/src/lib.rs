//! Client for an Elasticsearch-compatible engine over its REST API.

pub mod client;
pub mod query;
pub mod schema;

pub use client::ElasticClient;
