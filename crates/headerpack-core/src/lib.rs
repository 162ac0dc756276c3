//! HeaderPack Core
//!
//! Core types, errors and configuration shared by the HeaderPack crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AggregatorConfig, Config, OutputConfig, PreprocessorConfig, ResolvePolicy};
pub use error::{Error, Result};
pub use types::*;
