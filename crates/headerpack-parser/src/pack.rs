//! Header Packing Pipeline
//!
//! Chains aggregation, preprocessing and scrubbing, producing the
//! intermediate artifacts on disk.

use headerpack_core::{Config, Error, HeaderRef, OutputConfig, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::aggregator::{write_output, HeaderAggregator};
use crate::preprocessor::{ClangPreprocessor, Preprocessor};
use crate::scrubber::{scrub_stream, ScrubStats};

/// Locations of the files produced by one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub aggregation: PathBuf,
    pub preprocessed: Option<PathBuf>,
    pub packed: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Fill in unnamed intermediate files from the most downstream output.
    ///
    /// A packed output implies `<packed>.agr` and `<packed>.pp`; a
    /// preprocessed output alone implies `<preprocessed>.agr`.
    pub fn derive(output: &OutputConfig) -> Result<Self> {
        if let Some(packed) = &output.packed_file {
            return Ok(Self {
                aggregation: output
                    .aggregation_file
                    .clone()
                    .unwrap_or_else(|| with_suffix(packed, ".agr")),
                preprocessed: Some(
                    output
                        .preprocessed_file
                        .clone()
                        .unwrap_or_else(|| with_suffix(packed, ".pp")),
                ),
                packed: Some(packed.clone()),
            });
        }

        if let Some(preprocessed) = &output.preprocessed_file {
            return Ok(Self {
                aggregation: output
                    .aggregation_file
                    .clone()
                    .unwrap_or_else(|| with_suffix(preprocessed, ".agr")),
                preprocessed: Some(preprocessed.clone()),
                packed: None,
            });
        }

        match &output.aggregation_file {
            Some(aggregation) => Ok(Self {
                aggregation: aggregation.clone(),
                preprocessed: None,
                packed: None,
            }),
            None => Err(Error::Config(
                "you must specify some type of output".to_string(),
            )),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Summary of a pipeline run
#[derive(Debug, Clone)]
pub struct PackReport {
    pub artifacts: ArtifactPaths,
    /// Headers emitted into the aggregation file, in order
    pub headers: Vec<HeaderRef>,
    pub aggregated_lines: usize,
    /// Present when the scrub stage ran
    pub scrub: Option<ScrubStats>,
}

/// Aggregate, preprocess and scrub a header set
pub struct HeaderPacker {
    config: Config,
    aggregator: HeaderAggregator,
}

impl HeaderPacker {
    pub fn new(config: Config) -> Result<Self> {
        let aggregator = HeaderAggregator::from_config(&config.aggregator)?;
        Ok(Self { config, aggregator })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline, locating clang++ only if a preprocessing stage is needed
    pub fn run(&self) -> Result<PackReport> {
        let artifacts = ArtifactPaths::derive(&self.config.output)?;
        if artifacts.preprocessed.is_none() {
            return self.run_with(artifacts, None);
        }

        let clang = ClangPreprocessor::from_config(&self.config.preprocessor)?;
        self.run_with(artifacts, Some(&clang))
    }

    /// Run the pipeline with an explicit preprocessor backend
    pub fn run_with(
        &self,
        artifacts: ArtifactPaths,
        preprocessor: Option<&dyn Preprocessor>,
    ) -> Result<PackReport> {
        let aggregator_config = &self.config.aggregator;
        let aggregation = self
            .aggregator
            .aggregate(&aggregator_config.headers, &aggregator_config.ignore_files)?;
        write_output(&aggregation, Some(&artifacts.aggregation))?;
        info!(
            "Aggregated {} headers into {}",
            aggregation.headers.len(),
            artifacts.aggregation.display()
        );

        let mut scrub = None;
        if let Some(preprocessed) = &artifacts.preprocessed {
            let preprocessor = preprocessor.ok_or_else(|| {
                Error::Preprocess("no preprocessor available".to_string())
            })?;
            preprocessor.preprocess(&artifacts.aggregation, preprocessed)?;
            info!("Preprocessed with {} into {}", preprocessor.name(), preprocessed.display());

            if let Some(packed) = &artifacts.packed {
                let reader = BufReader::new(File::open(preprocessed)?);
                let mut writer = BufWriter::new(File::create(packed)?);
                let stats = scrub_stream(reader, &mut writer)?;
                info!(
                    "Packed {} of {} lines into {}",
                    stats.lines_written,
                    stats.lines_read,
                    packed.display()
                );
                scrub = Some(stats);
            }
        }

        Ok(PackReport {
            artifacts,
            aggregated_lines: aggregation.lines.len(),
            headers: aggregation.headers,
            scrub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    /// Wraps every line with the markers a real preprocessor would add
    struct MarkerPreprocessor;

    impl Preprocessor for MarkerPreprocessor {
        fn preprocess(&self, input: &Path, output: &Path) -> Result<()> {
            let source = fs::read_to_string(input)?;
            let mut out = format!("# 1 \"{}\"\n# 1 \"<built-in>\" 1\n\n", input.display());
            for (i, line) in source.lines().enumerate() {
                out.push_str(&format!("  {} # {} \"{}\" 2\n\n", line, i + 1, input.display()));
            }
            fs::write(output, out)?;
            Ok(())
        }

        fn name(&self) -> &str {
            "marker"
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn output(aggregation: Option<&str>, preprocessed: Option<&str>, packed: Option<&str>) -> OutputConfig {
        OutputConfig {
            aggregation_file: aggregation.map(PathBuf::from),
            preprocessed_file: preprocessed.map(PathBuf::from),
            packed_file: packed.map(PathBuf::from),
        }
    }

    #[test]
    fn test_derive_from_packed() {
        let paths = ArtifactPaths::derive(&output(None, None, Some("out/api.pk"))).unwrap();
        assert_eq!(paths.aggregation, PathBuf::from("out/api.pk.agr"));
        assert_eq!(paths.preprocessed, Some(PathBuf::from("out/api.pk.pp")));
        assert_eq!(paths.packed, Some(PathBuf::from("out/api.pk")));
    }

    #[test]
    fn test_derive_keeps_explicit_names() {
        let paths =
            ArtifactPaths::derive(&output(Some("a.agr"), Some("b.pp"), Some("c.pk"))).unwrap();
        assert_eq!(paths.aggregation, PathBuf::from("a.agr"));
        assert_eq!(paths.preprocessed, Some(PathBuf::from("b.pp")));
    }

    #[test]
    fn test_derive_from_preprocessed() {
        let paths = ArtifactPaths::derive(&output(None, Some("api.pp"), None)).unwrap();
        assert_eq!(paths.aggregation, PathBuf::from("api.pp.agr"));
        assert_eq!(paths.packed, None);
    }

    #[test]
    fn test_derive_requires_output() {
        assert!(matches!(
            ArtifactPaths::derive(&OutputConfig::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_full_pipeline() {
        let temp = TempDir::new().unwrap();
        let include = temp.path().join("include");
        fs::create_dir_all(&include).unwrap();
        fs::write(include.join("api.h"), "#include \"types.h\"\n\nvoid api(T t);\n").unwrap();
        fs::write(include.join("types.h"), "typedef int T;\n").unwrap();

        let mut config = Config::default();
        config.aggregator = headerpack_core::AggregatorConfig::single("api.h", &include);
        config.output.packed_file = Some(temp.path().join("api.pk"));

        let packer = HeaderPacker::new(config).unwrap();
        let artifacts = ArtifactPaths::derive(&packer.config().output).unwrap();
        let report = packer.run_with(artifacts, Some(&MarkerPreprocessor)).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("api.pk.agr")).unwrap(),
            "typedef int T;\n\nvoid api(T t);\n"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("api.pk")).unwrap(),
            "typedef int T;\nvoid api(T t);\n"
        );
        assert_eq!(report.headers.len(), 2);
        assert_eq!(report.aggregated_lines, 3);
        let stats = report.scrub.unwrap();
        assert_eq!(stats.lines_written, 2);
    }

    #[test]
    fn test_aggregation_only_skips_preprocessor() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.h"), "int a;\n").unwrap();

        let mut config = Config::default();
        config.aggregator = headerpack_core::AggregatorConfig::single("a.h", temp.path());
        config.output.aggregation_file = Some(temp.path().join("a.agr"));

        let report = HeaderPacker::new(config).unwrap().run().unwrap();

        assert!(report.scrub.is_none());
        assert_eq!(fs::read_to_string(temp.path().join("a.agr")).unwrap(), "int a;\n");
    }

    #[test]
    fn test_preprocessing_without_backend_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.h"), "int a;\n").unwrap();

        let mut config = Config::default();
        config.aggregator = headerpack_core::AggregatorConfig::single("a.h", temp.path());
        config.output.preprocessed_file = Some(temp.path().join("a.pp"));

        let packer = HeaderPacker::new(config).unwrap();
        let artifacts = ArtifactPaths::derive(&packer.config().output).unwrap();
        assert!(matches!(
            packer.run_with(artifacts, None),
            Err(Error::Preprocess(_))
        ));
    }
}
