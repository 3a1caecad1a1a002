use std::time::Duration;

use docsearch_core::config::ElasticSettings;
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::{DocumentRecord, EngineHit, IndexSchema, SearchRequest};
use docsearch_core::{Error, Result};
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{query, schema};

/// Blocking REST client. Built once per process and shared by reference.
pub struct ElasticClient {
    base_url: String,
    http: reqwest::blocking::Client,
    username: Option<String>,
    password: Option<String>,
    refresh_on_index: bool,
}

impl std::fmt::Debug for ElasticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        reason: String,
    },
    Plain(String),
}

#[derive(Deserialize)]
struct CatIndex {
    index: String,
}

#[derive(Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: HitSource,
}

#[derive(Deserialize, Default)]
struct HitSource {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    content: String,
}

impl ElasticClient {
    pub fn new(settings: &ElasticSettings) -> Result<Self> {
        if settings.url.starts_with("http://") && settings.password.is_some() {
            tracing::warn!("search engine URL uses unencrypted HTTP; credentials will be sent in plain text");
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .danger_accept_invalid_certs(settings.insecure)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("search engine http client: {e}")))?;
        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            http,
            username: settings.username.clone(),
            password: settings.password.clone(),
            refresh_on_index: settings.refresh_on_index,
        })
    }

    /// Build the client and check that the engine answers.
    pub fn connect(settings: &ElasticSettings) -> Result<Self> {
        let client = Self::new(settings)?;
        client.ping()?;
        tracing::info!(url = %client.base_url, "connected to search engine");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}/{}", self.base_url, path.trim_start_matches('/')));
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    fn send(&self, op: &'static str, builder: RequestBuilder) -> Result<Response> {
        builder.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                Error::Connection { url: self.base_url.clone(), message: e.to_string() }
            } else {
                Error::engine(op, e.status().map(|s| s.as_u16()), e.to_string())
            }
        })
    }

    /// Turn a non-success response into an error, keeping the engine's reason.
    fn check(op: &'static str, target: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let (kind, reason) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(ErrorEnvelope { error: ErrorBody::Detailed { kind, reason } }) => (kind, reason),
            Ok(ErrorEnvelope { error: ErrorBody::Plain(reason) }) => (String::new(), reason),
            Err(_) => (String::new(), body),
        };
        if status == StatusCode::NOT_FOUND && (kind == "index_not_found_exception" || kind.is_empty()) {
            return Err(Error::IndexNotFound(target.to_string()));
        }
        let message = if reason.is_empty() { format!("HTTP {status}") } else { format!("HTTP {status}: {reason}") };
        Err(Error::engine(op, Some(status.as_u16()), message))
    }

    fn json<T: DeserializeOwned>(op: &'static str, response: Response) -> Result<T> {
        response.json().map_err(|e| Error::engine(op, None, format!("unexpected response: {e}")))
    }
}

impl SearchBackend for ElasticClient {
    fn ping(&self) -> Result<()> {
        let response = self.send("ping", self.request(Method::GET, "/"))?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(Error::Connection { url: self.base_url.clone(), message: format!("HTTP {}", response.status()) })
    }

    fn index_exists(&self, name: &str) -> Result<bool> {
        let response = self.send("index_exists", self.request(Method::HEAD, name))?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Error::engine("index_exists", Some(s.as_u16()), format!("HTTP {s}"))),
        }
    }

    fn create_index(&self, name: &str, schema: &IndexSchema) -> Result<()> {
        let builder = self.request(Method::PUT, name).json(&schema::index_body(schema));
        Self::check("create_index", name, self.send("create_index", builder)?)?;
        tracing::info!(index = name, dims = schema.dims, "index created");
        Ok(())
    }

    fn delete_index(&self, name: &str) -> Result<()> {
        Self::check("delete_index", name, self.send("delete_index", self.request(Method::DELETE, name))?)?;
        tracing::info!(index = name, "index deleted");
        Ok(())
    }

    /// Open indices only; closed ones would fail a combined `_search`.
    fn list_indices(&self) -> Result<Vec<String>> {
        let path = "_cat/indices?format=json&h=index&expand_wildcards=open";
        let response = self.send("list_indices", self.request(Method::GET, path))?;
        let rows: Vec<CatIndex> = Self::json("list_indices", Self::check("list_indices", "_all", response)?)?;
        Ok(rows.into_iter().map(|r| r.index).collect())
    }

    fn index_document(&self, index: &str, record: &DocumentRecord) -> Result<String> {
        let path = if self.refresh_on_index { format!("{index}/_doc?refresh=wait_for") } else { format!("{index}/_doc") };
        let response = self.send("index_document", self.request(Method::POST, &path).json(record))?;
        let created: IndexResponse = Self::json("index_document", Self::check("index_document", index, response)?)?;
        tracing::debug!(index, id = %created.id, "document stored");
        Ok(created.id)
    }

    fn count_documents(&self, index: &str) -> Result<u64> {
        let response = self.send("count", self.request(Method::GET, &format!("{index}/_count")))?;
        let count: CountResponse = Self::json("count", Self::check("count", index, response)?)?;
        Ok(count.count)
    }

    fn search(&self, indices: &[String], request: &SearchRequest) -> Result<Vec<EngineHit>> {
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        let target = indices.join(",");
        // An index closed or dropped since discovery is skipped, not fatal.
        let path = format!("{target}/_search?ignore_unavailable=true");
        let builder = self.request(Method::POST, &path).json(&query::render(request));
        let response: SearchResponse = Self::json("search", Self::check("search", &target, self.send("search", builder)?)?)?;
        Ok(response
            .hits
            .hits
            .into_iter()
            .map(|h| EngineHit {
                index: h.index,
                score: h.score.unwrap_or(0.0),
                filename: h.source.filename,
                content: h.source.content,
            })
            .collect())
    }
}
