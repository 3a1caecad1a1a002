//! Per-document index lifecycle.

use docsearch_core::naming::{index_name_for, validate_index_name};
use docsearch_core::traits::SearchBackend;
use docsearch_core::types::IndexSchema;
use docsearch_core::{Error, Result};

/// Drop `name` if it exists and create it again with `schema`.
///
/// Not atomic: between the delete and the create the index is absent.
/// Callers must not run this concurrently for the same name.
pub fn ensure_fresh_index<B: SearchBackend + ?Sized>(backend: &B, name: &str, schema: &IndexSchema) -> Result<()> {
    validate_index_name(name)?;
    if backend.index_exists(name)? {
        match backend.delete_index(name) {
            Ok(()) | Err(Error::IndexNotFound(_)) => tracing::debug!(index = name, "dropped existing index"),
            Err(e) => return Err(e),
        }
    }
    backend.create_index(name, schema)
}

/// Every index outside `reserved_prefix`, sorted by name.
pub fn user_indices<B: SearchBackend + ?Sized>(backend: &B, reserved_prefix: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> =
        backend.list_indices()?.into_iter().filter(|name| !name.starts_with(reserved_prefix)).collect();
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed(String),
    Missing(String),
}

/// Delete the index that holds `filename`.
pub fn remove_index_for<B: SearchBackend + ?Sized>(backend: &B, filename: &str) -> Result<Removal> {
    if filename.trim().is_empty() {
        return Err(Error::MissingParameter("filename"));
    }
    let name = index_name_for(filename.trim())?;
    if !backend.index_exists(&name)? {
        return Ok(Removal::Missing(name));
    }
    match backend.delete_index(&name) {
        Ok(()) => Ok(Removal::Removed(name)),
        Err(Error::IndexNotFound(_)) => Ok(Removal::Missing(name)),
        Err(e) => Err(e),
    }
}
