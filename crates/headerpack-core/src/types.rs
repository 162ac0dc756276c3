//! Core data types

use std::path::{Path, PathBuf};

/// A header as named by an include directive, with its resolved location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderRef {
    /// Name as written between the include delimiters
    pub name: String,
    /// Canonical absolute path the name resolved to
    pub path: PathBuf,
}

impl HeaderRef {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

/// Canonical absolute form of `path`.
///
/// Symlinks are resolved when the file exists. Paths that do not exist
/// (an ignore entry may name an absent file) are made absolute without
/// touching the filesystem.
pub fn canonical_path(path: &Path) -> std::io::Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(p) => Ok(p),
        Err(_) => std::path::absolute(path),
    }
}
