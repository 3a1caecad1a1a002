use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by callers to decide between aborting,
/// reporting and continuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input. Reported immediately, never retried.
    Input,
    /// The search engine cannot be reached at all.
    Connectivity,
    /// A single engine operation failed.
    Engine,
    /// Local failures: model, extraction, configuration, I/O.
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unsupported extension: .{ext} ({})", .path.display())]
    UnsupportedExtension { path: PathBuf, ext: String },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid index name '{name}': {reason}")]
    InvalidIndexName { name: String, reason: &'static str },

    #[error("Cannot embed empty text")]
    EmptyText,

    #[error("Cannot reach search engine at {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Search engine {op} failed: {message}")]
    Engine {
        op: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Failed to extract text from {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn engine(op: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Engine { op, status, message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingParameter(_)
            | Self::UnsupportedExtension { .. }
            | Self::FileNotFound(_)
            | Self::InvalidIndexName { .. }
            | Self::EmptyText => ErrorKind::Input,
            Self::Connection { .. } => ErrorKind::Connectivity,
            Self::Engine { .. } | Self::IndexNotFound(_) => ErrorKind::Engine,
            Self::Embedding(_) | Self::Extraction { .. } | Self::InvalidConfig(_) | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
