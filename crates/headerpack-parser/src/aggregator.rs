//! Header Aggregator
//!
//! Flattens a set of C/C++ headers into one ordered line stream by
//! recursively following `#include` directives. Each header is emitted at
//! most once, in depth-first include order.

use headerpack_core::{canonical_path, AggregatorConfig, Error, HeaderRef, ResolvePolicy, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

static INCLUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*#\s*include\s+["<]([^">]+)[">]"#).expect("include pattern is valid")
});

static INCLUDE_NEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*include_next").expect("include_next pattern is valid"));

/// Result of one aggregation run
#[derive(Debug, Default, Clone)]
pub struct Aggregation {
    /// Flattened output, one entry per physical line, terminators stripped
    pub lines: Vec<String>,
    /// Headers whose content was emitted, in emission order
    pub headers: Vec<HeaderRef>,
}

impl Aggregation {
    /// Write every line followed by a newline
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for line in &self.lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Write an aggregation to `path`, or to stdout when no path is given
pub fn write_output(aggregation: &Aggregation, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            aggregation.write_to(&mut writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            aggregation.write_to(&mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Traversal state for a single aggregation run
struct AggregationContext {
    /// Canonical paths already emitted or ignored
    processed: HashSet<PathBuf>,
    output: Aggregation,
}

/// Outcome of looking a header name up in the search paths
enum Resolution {
    /// Emit the file at this canonical path
    Process(PathBuf),
    /// The file exists but was already emitted or ignored
    Satisfied(PathBuf),
}

/// Recursive, cycle-safe header flattener
#[derive(Debug, Clone)]
pub struct HeaderAggregator {
    /// Include search paths, highest priority first
    search_paths: Vec<PathBuf>,
    policy: ResolvePolicy,
}

impl HeaderAggregator {
    /// Create an aggregator over a non-empty search path list
    pub fn new(search_paths: Vec<PathBuf>) -> Result<Self> {
        Self::with_policy(search_paths, ResolvePolicy::default())
    }

    /// Create an aggregator with an explicit search path matching rule
    pub fn with_policy(search_paths: Vec<PathBuf>, policy: ResolvePolicy) -> Result<Self> {
        if search_paths.is_empty() {
            return Err(Error::Config(
                "at least one include search path is required".to_string(),
            ));
        }
        Ok(Self {
            search_paths,
            policy,
        })
    }

    /// Create an aggregator from configuration
    pub fn from_config(config: &AggregatorConfig) -> Result<Self> {
        config.validate()?;
        Self::with_policy(config.include_search_paths.clone(), config.resolve_policy)
    }

    /// Flatten `headers` in order.
    ///
    /// Files in `ignore` count as already emitted: they never contribute
    /// content and referencing them is not an error.
    pub fn aggregate<S: AsRef<str>>(&self, headers: &[S], ignore: &[PathBuf]) -> Result<Aggregation> {
        let mut processed = HashSet::with_capacity(ignore.len());
        for path in ignore {
            processed.insert(canonical_path(path)?);
        }

        let mut ctx = AggregationContext {
            processed,
            output: Aggregation::default(),
        };

        for header in headers {
            self.process_header(header.as_ref(), &mut ctx)?;
        }

        debug!(
            "Aggregated {} headers into {} lines",
            ctx.output.headers.len(),
            ctx.output.lines.len()
        );
        Ok(ctx.output)
    }

    fn process_header(&self, header: &str, ctx: &mut AggregationContext) -> Result<()> {
        let path = match self.resolve(header, &ctx.processed)? {
            Resolution::Process(path) => path,
            Resolution::Satisfied(path) => {
                trace!("Skipping {} ({:?} already processed)", header, path);
                return Ok(());
            }
        };

        // Marked before reading so a header that reaches itself terminates.
        ctx.processed.insert(path.clone());
        debug!("Processing {} from {:?}", header, path);

        let reader = BufReader::new(File::open(&path)?);
        let body = reader.lines().collect::<io::Result<Vec<_>>>()?;
        ctx.output.headers.push(HeaderRef::new(header, path.clone()));

        for line in body {
            if let Some(child) = include_target(&line) {
                self.process_header(child, ctx)?;
            } else if is_include_next(&line) {
                return Err(Error::UnsupportedDirective {
                    directive: "#include_next".to_string(),
                    file: path,
                });
            } else {
                ctx.output.lines.push(line);
            }
        }

        Ok(())
    }

    /// Locate `header` in the search paths
    fn resolve(&self, header: &str, processed: &HashSet<PathBuf>) -> Result<Resolution> {
        let mut satisfied = None;

        for search_path in &self.search_paths {
            let trial = search_path.join(header);
            if !trial.is_file() {
                continue;
            }

            let path = canonical_path(&trial)?;
            if !processed.contains(&path) {
                debug!("Resolved {} in {:?}", header, search_path);
                return Ok(Resolution::Process(path));
            }

            match self.policy {
                ResolvePolicy::FirstMatch => return Ok(Resolution::Satisfied(path)),
                ResolvePolicy::FirstUnprocessed => {
                    satisfied.get_or_insert(path);
                }
            }
        }

        match satisfied {
            Some(path) => Ok(Resolution::Satisfied(path)),
            None => {
                debug!("Failed to resolve header: {}", header);
                Err(Error::HeaderNotFound(header.to_string()))
            }
        }
    }
}

/// Name captured by an include directive on `line`, if any
pub fn include_target(line: &str) -> Option<&str> {
    INCLUDE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether `line` is an `#include_next` directive
pub fn is_include_next(line: &str) -> bool {
    INCLUDE_NEXT_RE.is_match(line)
}
