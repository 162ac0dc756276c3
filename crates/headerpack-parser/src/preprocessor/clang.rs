//! Clang Preprocessor Integration
//!
//! Wraps `clang++ -E` for expanding an aggregated C++ header.

use headerpack_core::PreprocessorConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

use super::Preprocessor;

/// Errors that can occur during preprocessing
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Clang not found. Please install clang or pass its path explicitly.")]
    ClangNotFound,

    #[error("Clang exited with {status}: {stderr}")]
    PreprocessFailed { status: String, stderr: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid source file: {0}")]
    InvalidSource(String),
}

impl From<PreprocessError> for headerpack_core::Error {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::IoError(e) => Self::Io(e),
            other => Self::Preprocess(other.to_string()),
        }
    }
}

/// Options for preprocessing
#[derive(Debug, Clone, Default)]
pub struct PreprocessOptions {
    /// Additional clang arguments, placed before the input file
    pub extra_args: Vec<String>,
}

impl PreprocessOptions {
    /// Create options from configuration
    pub fn from_config(config: &PreprocessorConfig) -> Self {
        Self {
            extra_args: config.switches.clone(),
        }
    }
}

/// Clang preprocessor wrapper
pub struct ClangPreprocessor {
    /// Path to clang++ executable
    clang_path: PathBuf,
    options: PreprocessOptions,
}

impl ClangPreprocessor {
    /// Create a new preprocessor, auto-detecting clang++ location
    pub fn new(options: PreprocessOptions) -> Result<Self, PreprocessError> {
        let clang_path = Self::find_clang()?;
        debug!("Found clang at: {:?}", clang_path);
        Ok(Self {
            clang_path,
            options,
        })
    }

    /// Create a preprocessor with a specific clang++ path
    pub fn with_path(clang_path: PathBuf, options: PreprocessOptions) -> Self {
        Self {
            clang_path,
            options,
        }
    }

    /// Create a preprocessor from configuration
    pub fn from_config(config: &PreprocessorConfig) -> Result<Self, PreprocessError> {
        let options = PreprocessOptions::from_config(config);
        match &config.clang_path {
            Some(path) => Ok(Self::with_path(path.clone(), options)),
            None => Self::new(options),
        }
    }

    /// Find clang++ executable
    fn find_clang() -> Result<PathBuf, PreprocessError> {
        let candidates = [
            "clang++",
            "/usr/bin/clang++",
            "/usr/local/bin/clang++",
            "/opt/homebrew/opt/llvm/bin/clang++",
        ];

        for candidate in candidates {
            if let Ok(output) = Command::new(candidate).arg("--version").output() {
                if output.status.success() {
                    return Ok(PathBuf::from(candidate));
                }
            }
        }

        Err(PreprocessError::ClangNotFound)
    }

    /// Get the clang++ path in use
    pub fn clang_path(&self) -> &Path {
        &self.clang_path
    }

    /// Run clang over `input`, writing the result to `output`
    pub fn preprocess_file(&self, input: &Path, output: &Path) -> Result<(), PreprocessError> {
        if !input.is_file() {
            return Err(PreprocessError::InvalidSource(format!(
                "File not found: {}",
                input.display()
            )));
        }

        let args = self.build_args(input, output);
        debug!("Preprocessing {:?} with args: {:?}", input, args);

        let result = Command::new(&self.clang_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let stderr = String::from_utf8_lossy(&result.stderr);
        if !result.status.success() {
            return Err(PreprocessError::PreprocessFailed {
                status: result.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        for warning in stderr.lines().filter(|line| line.contains("warning:")) {
            warn!("{}", warning);
        }
        Ok(())
    }

    /// Build clang command line arguments
    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-x".to_string(),
            "c++".to_string(),
            "-E".to_string(),
        ];
        args.extend(self.options.extra_args.iter().cloned());
        args.push(input.display().to_string());
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args
    }
}

impl Preprocessor for ClangPreprocessor {
    fn preprocess(&self, input: &Path, output: &Path) -> headerpack_core::Result<()> {
        self.preprocess_file(input, output)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "clang"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.clang_path)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headerpack_core::Error;

    #[test]
    fn test_build_args() {
        let options = PreprocessOptions {
            extra_args: vec!["-DNDEBUG".to_string(), "-std=c++17".to_string()],
        };
        let preprocessor = ClangPreprocessor::with_path(PathBuf::from("clang++"), options);

        let args = preprocessor.build_args(Path::new("model.agr"), Path::new("model.pp"));

        assert_eq!(
            args,
            vec!["-x", "c++", "-E", "-DNDEBUG", "-std=c++17", "model.agr", "-o", "model.pp"]
        );
    }

    #[test]
    fn test_from_config_uses_explicit_path() {
        let config = PreprocessorConfig {
            clang_path: Some(PathBuf::from("/opt/llvm/bin/clang++")),
            switches: vec!["-I/opt/include".to_string()],
        };
        let preprocessor = ClangPreprocessor::from_config(&config).unwrap();

        assert_eq!(preprocessor.clang_path(), Path::new("/opt/llvm/bin/clang++"));
        assert_eq!(preprocessor.options.extra_args, vec!["-I/opt/include".to_string()]);
    }

    #[test]
    fn test_missing_input_rejected() {
        let preprocessor =
            ClangPreprocessor::with_path(PathBuf::from("clang++"), PreprocessOptions::default());
        let err = preprocessor
            .preprocess_file(Path::new("/nonexistent/input.agr"), Path::new("out.pp"))
            .unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidSource(_)));
    }

    #[test]
    fn test_unrunnable_clang_is_unavailable() {
        let preprocessor = ClangPreprocessor::with_path(
            PathBuf::from("/nonexistent/bin/clang++"),
            PreprocessOptions::default(),
        );
        assert!(!preprocessor.is_available());
        assert_eq!(preprocessor.name(), "clang");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = PreprocessError::ClangNotFound.into();
        assert!(matches!(err, Error::Preprocess(_)));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = PreprocessError::IoError(io).into();
        assert!(matches!(err, Error::Io(_)));
    }
}
