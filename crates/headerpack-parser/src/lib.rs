//! HeaderPack Parser
//!
//! Flattens C/C++ header graphs into a single translation unit and scrubs
//! the preprocessor's output down to a compact text blob.
//!
//! ## Modules
//!
//! - `aggregator` - Recursive, deduplicating `#include` resolution
//! - `scrubber` - Line marker and blank line removal
//! - `preprocessor` - Clang preprocessor integration
//! - `pack` - Aggregate, preprocess and scrub in one run

pub mod aggregator;
pub mod pack;
pub mod preprocessor;
pub mod scrubber;

pub use aggregator::{write_output, Aggregation, HeaderAggregator};
pub use pack::{ArtifactPaths, HeaderPacker, PackReport};
pub use preprocessor::{ClangPreprocessor, PreprocessOptions, Preprocessor};
pub use scrubber::{scrub, scrub_line, scrub_stream, ScrubStats};
