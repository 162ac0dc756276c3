//! Configuration types

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Search path used when none is configured
pub const DEFAULT_INCLUDE_SEARCH_PATH: &str = ".";

/// HeaderPack configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header aggregation configuration
    pub aggregator: AggregatorConfig,

    /// External preprocessor configuration
    pub preprocessor: PreprocessorConfig,

    /// Output artifact locations
    pub output: OutputConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

/// How a header name is matched against the search path list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// The first search path holding the name decides. If that file was
    /// already emitted or ignored, the include is satisfied.
    #[default]
    FirstMatch,
    /// Keep scanning later search paths for a same-named file that has not
    /// been emitted yet.
    FirstUnprocessed,
}

/// Aggregator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Entry headers, processed in order
    #[serde(deserialize_with = "one_or_many")]
    pub headers: Vec<String>,

    /// Directories searched for headers, highest priority first
    #[serde(deserialize_with = "one_or_many")]
    pub include_search_paths: Vec<PathBuf>,

    /// Files treated as already satisfied and never emitted
    #[serde(deserialize_with = "one_or_many")]
    pub ignore_files: Vec<PathBuf>,

    /// Search path matching rule
    pub resolve_policy: ResolvePolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            include_search_paths: vec![PathBuf::from(DEFAULT_INCLUDE_SEARCH_PATH)],
            ignore_files: Vec::new(),
            resolve_policy: ResolvePolicy::default(),
        }
    }
}

impl AggregatorConfig {
    /// Configuration for a single header and a single search path
    pub fn single(header: impl Into<String>, search_path: impl Into<PathBuf>) -> Self {
        Self {
            headers: vec![header.into()],
            include_search_paths: vec![search_path.into()],
            ..Self::default()
        }
    }

    /// Check the configuration can drive an aggregation run
    pub fn validate(&self) -> Result<()> {
        if self.include_search_paths.is_empty() {
            return Err(Error::Config(
                "at least one include search path is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// External preprocessor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// Explicit path to clang++; auto-detected when absent
    pub clang_path: Option<PathBuf>,

    /// Additional switches passed through to the preprocessor
    #[serde(deserialize_with = "one_or_many")]
    pub switches: Vec<String>,
}

/// Output artifact locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Flattened header output
    pub aggregation_file: Option<PathBuf>,

    /// Raw preprocessor output
    pub preprocessed_file: Option<PathBuf>,

    /// Scrubbed final output
    pub packed_file: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Accept either a lone value or a list, always producing a list
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    OneOrMany::deserialize(deserializer).map(Into::into)
}
