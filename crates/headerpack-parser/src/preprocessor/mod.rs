//! External Preprocessor Integration
//!
//! Runs the C++ preprocessor over an aggregated header so macros and
//! conditionals are expanded before the output is scrubbed.

pub mod clang;

pub use clang::{ClangPreprocessor, PreprocessError, PreprocessOptions};

use headerpack_core::Result;
use std::path::Path;

/// Preprocessor backend
pub trait Preprocessor {
    /// Preprocess `input`, writing the expanded translation unit to `output`
    fn preprocess(&self, input: &Path, output: &Path) -> Result<()>;

    /// Get preprocessor name
    fn name(&self) -> &str;

    /// Check if the preprocessor can be run
    fn is_available(&self) -> bool;
}
