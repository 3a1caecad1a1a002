//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + the `ELASTIC_*` connection variables + `APP_*` env
//! vars (nested with `__`, e.g. `APP_SEARCH__MIN_SCORE=1.5`). Provides
//! helpers to expand `~` and `${VAR}` and to resolve relative paths against
//! a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data_processor::DocumentFormat;
use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::debug!(env = other, "no environment-specific config file"),
        }
        figment = figment.merge(elastic_env()).merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the full typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// `ELASTIC_HOST`, `ELASTIC_USER` and `ELASTIC_PASSWORD`, mapped onto the
/// `elastic` section.
fn elastic_env() -> Env {
    Env::raw().only(&["ELASTIC_HOST", "ELASTIC_USER", "ELASTIC_PASSWORD"]).map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        match key.as_str() {
            "elastic_host" => "elastic.url".into(),
            "elastic_user" => "elastic.username".into(),
            _ => "elastic.password".into(),
        }
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub elastic: ElasticSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub ingest: IngestSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Skip TLS certificate verification (self-signed development clusters).
    pub insecure: bool,
    pub timeout_secs: u64,
    /// Ask the engine to make each indexed record searchable before returning.
    pub refresh_on_index: bool,
}

impl Default for ElasticSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            insecure: true,
            timeout_secs: 30,
            refresh_on_index: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub model_dir: Option<String>,
    pub dims: usize,
    pub max_tokens: usize,
    pub normalize: bool,
    pub use_fake: bool,
    /// Texts up to this many characters are embedded in a single call.
    pub direct_max_chars: usize,
    /// Chunk size, in characters, for longer texts.
    pub chunk_chars: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            model_dir: None,
            dims: 384,
            max_tokens: 128,
            normalize: false,
            use_fake: false,
            direct_max_chars: 4000,
            chunk_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// One combined lexical + semantic query across every user index.
    #[default]
    Hybrid,
    /// One semantic query per user index, merged client-side.
    Fanout,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hybrid => f.write_str("hybrid"),
            Self::Fanout => f.write_str("fanout"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hybrid" => Ok(Self::Hybrid),
            "fanout" | "fan-out" | "semantic" => Ok(Self::Fanout),
            other => Err(Error::InvalidConfig(format!("unknown search mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub mode: SearchMode,
    pub max_results: usize,
    /// Hybrid hits scoring below this are dropped (inclusive boundary).
    pub min_score: f32,
    pub lexical_weight: f32,
    pub phrase_weight: f32,
    pub reserved_prefix: String,
    pub preview_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            mode: SearchMode::Hybrid,
            max_results: 10,
            min_score: 1.30,
            lexical_weight: 3.0,
            phrase_weight: 5.0,
            reserved_prefix: crate::naming::RESERVED_PREFIX.to_string(),
            preview_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub docs_dir: String,
    pub extensions: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { docs_dir: "docs".to_string(), extensions: vec!["pdf".into(), "txt".into(), "docx".into()] }
    }
}

impl IngestSettings {
    pub fn docs_dir(&self) -> PathBuf {
        expand_path(&self.docs_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:5000".to_string() }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if self.elastic.url.trim().is_empty() {
            return invalid("elastic.url must not be empty".into());
        }
        if self.embedding.dims == 0 {
            return invalid("embedding.dims must be positive".into());
        }
        if self.embedding.chunk_chars == 0 {
            return invalid("embedding.chunk_chars must be positive".into());
        }
        if self.embedding.max_tokens == 0 {
            return invalid("embedding.max_tokens must be positive".into());
        }
        if !self.search.min_score.is_finite() {
            return invalid("search.min_score must be finite".into());
        }
        for (name, weight) in [("lexical_weight", self.search.lexical_weight), ("phrase_weight", self.search.phrase_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return invalid(format!("search.{name} must be a non-negative number"));
            }
        }
        if self.search.reserved_prefix.is_empty() {
            return invalid("search.reserved_prefix must not be empty".into());
        }
        if self.ingest.extensions.is_empty() {
            return invalid("ingest.extensions must list at least one extension".into());
        }
        if let Some(ext) = self.ingest.extensions.iter().find(|e| DocumentFormat::from_extension(e).is_none()) {
            return invalid(format!("ingest.extensions: no extractor for '.{ext}'"));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_reference_behavior() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dims, 384);
        assert_eq!(settings.embedding.direct_max_chars, 4000);
        assert_eq!(settings.embedding.chunk_chars, 2000);
        assert!((settings.search.min_score - 1.30).abs() < f32::EPSILON);
        assert_eq!(settings.search.mode, SearchMode::Hybrid);
        assert_eq!(settings.ingest.extensions, ["pdf", "txt", "docx"]);
        settings.validate().expect("defaults are valid");
    }

    #[test]
    fn toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [search]
                min_score = 1.5
                mode = "fanout"

                [ingest]
                docs_dir = "papers"
                "#,
            )?;
            jail.set_env("APP_SEARCH__MAX_RESULTS", "25");
            jail.set_env("ELASTIC_HOST", "https://es.internal:9200");
            jail.set_env("ELASTIC_USER", "elastic");

            let settings = Config::load_for_env("none").map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
            assert!((settings.search.min_score - 1.5).abs() < f32::EPSILON);
            assert_eq!(settings.search.mode, SearchMode::Fanout);
            assert_eq!(settings.search.max_results, 25);
            assert_eq!(settings.ingest.docs_dir, "papers");
            assert_eq!(settings.elastic.url, "https://es.internal:9200");
            assert_eq!(settings.elastic.username.as_deref(), Some("elastic"));
            assert_eq!(settings.embedding.dims, 384, "untouched sections keep defaults");
            Ok(())
        });
    }

    #[test]
    fn env_specific_file_is_merged() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\nmax_results = 5\n")?;
            jail.create_file("config.test.toml", "[search]\nmax_results = 7\n")?;
            let config = Config::load_for_env("test").map_err(|e| e.to_string())?;
            let max: usize = config.get("search.max_results").map_err(|e| e.to_string())?;
            assert_eq!(max, 7);
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_unknown_extension() {
        let mut settings = Settings::default();
        settings.ingest.extensions.push("xls".into());
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn search_mode_parses_aliases() {
        assert_eq!("HYBRID".parse::<SearchMode>().unwrap(), SearchMode::Hybrid);
        assert_eq!("fan-out".parse::<SearchMode>().unwrap(), SearchMode::Fanout);
        assert!("bm25".parse::<SearchMode>().is_err());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_with_base(base, "docs"), PathBuf::from("/srv/app/docs"));
        assert_eq!(resolve_with_base(base, "/data/docs"), PathBuf::from("/data/docs"));
    }
}
