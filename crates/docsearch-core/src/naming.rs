//! Index naming: one index per source file, named after its base name.

use std::path::Path;

use crate::error::{Error, Result};

/// Prefix the engine reserves for its own indices.
pub const RESERVED_PREFIX: &str = ".";

const MAX_NAME_BYTES: usize = 255;
const FORBIDDEN_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ':'];

/// Derive the index name for `filename`: file name component, last
/// extension stripped, lower-cased. `Report.v2.PDF` becomes `report.v2`.
pub fn index_name_for(filename: &str) -> Result<String> {
    let base = Path::new(filename)
        .file_name()
        .ok_or_else(|| Error::InvalidIndexName { name: filename.to_string(), reason: "no file name" })?;
    let stem = Path::new(base).file_stem().unwrap_or(base).to_string_lossy().to_lowercase();
    validate_index_name(&stem)?;
    Ok(stem)
}

/// Checks `name` against the engine's index naming rules. Names under the
/// reserved prefix are refused so a document can never pass for a system
/// index.
pub fn validate_index_name(name: &str) -> Result<()> {
    let invalid = |reason| Err(Error::InvalidIndexName { name: name.to_string(), reason });
    if name.is_empty() {
        return invalid("empty name");
    }
    if name == "." || name == ".." {
        return invalid("reserved name");
    }
    if name.starts_with(RESERVED_PREFIX) {
        return invalid("starts with the reserved system prefix");
    }
    if name.starts_with(['-', '_', '+']) {
        return invalid("must not start with '-', '_' or '+'");
    }
    if name.chars().any(|c| FORBIDDEN_CHARS.contains(&c) || c.is_whitespace()) {
        return invalid("contains a forbidden character");
    }
    if name.chars().any(char::is_uppercase) {
        return invalid("must be lower-case");
    }
    if name.len() > MAX_NAME_BYTES {
        return invalid("longer than 255 bytes");
    }
    Ok(())
}
