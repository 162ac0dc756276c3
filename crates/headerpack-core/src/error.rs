//! Error types for HeaderPack

use std::path::PathBuf;
use thiserror::Error;

/// HeaderPack error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find {0}")]
    HeaderNotFound(String),

    #[error("No support for {directive} (in {})", file.display())]
    UnsupportedDirective { directive: String, file: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preprocessing failed: {0}")]
    Preprocess(String),
}

/// Result type alias for HeaderPack
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = Error::HeaderNotFound("missing.h".to_string());
        assert_eq!(err.to_string(), "Could not find missing.h");

        let err = Error::UnsupportedDirective {
            directive: "#include_next".to_string(),
            file: PathBuf::from("/inc/limits.h"),
        };
        assert_eq!(err.to_string(), "No support for #include_next (in /inc/limits.h)");
    }
}
