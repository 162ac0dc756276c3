//! HeaderPack CLI
//!
//! Command-line interface for flattening and packing C++ headers.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use headerpack_core::Config;
use headerpack_parser::{scrub_stream, write_output, HeaderAggregator, HeaderPacker};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "headerpack")]
#[command(author, version, about = "C++ header aggregation and packing tool", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the commands that aggregate headers
#[derive(Args)]
struct AggregateArgs {
    /// Header files to process, in order
    #[arg(value_name = "HEADER")]
    headers: Vec<String>,

    /// Directory to search for headers (repeatable, first match wins)
    #[arg(short = 'I', long = "include-path", value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// File to treat as already included (repeatable)
    #[arg(short = 'i', long = "ignore", value_name = "FILE")]
    ignore: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten headers into a single file
    Aggregate {
        #[command(flatten)]
        args: AggregateArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Strip line markers and blank lines from preprocessor output
    Scrub {
        /// Preprocessed file, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate, preprocess with clang++ and scrub
    Pack {
        #[command(flatten)]
        args: AggregateArgs,

        /// Path to the clang++ executable
        #[arg(long, value_name = "PATH")]
        clang: Option<PathBuf>,

        /// Extra switch passed to clang++ (repeatable)
        #[arg(short = 'w', long = "switch", value_name = "SWITCH", allow_hyphen_values = true)]
        switches: Vec<String>,

        /// Aggregated header file
        #[arg(short, long = "aggregation-file", value_name = "FILE")]
        aggregation_file: Option<PathBuf>,

        /// Preprocessed file
        #[arg(short, long = "preprocessed", value_name = "FILE")]
        preprocessed: Option<PathBuf>,

        /// Packed output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Aggregate { args, output } => {
            cmd_aggregate(args, output.as_deref())?;
        }
        Commands::Scrub { input, output } => {
            cmd_scrub(&input, output.as_deref())?;
        }
        Commands::Pack {
            args,
            clang,
            switches,
            aggregation_file,
            preprocessed,
            output,
        } => {
            let mut config = load_config(&args)?;
            if clang.is_some() {
                config.preprocessor.clang_path = clang;
            }
            config.preprocessor.switches.extend(switches);
            if aggregation_file.is_some() {
                config.output.aggregation_file = aggregation_file;
            }
            if preprocessed.is_some() {
                config.output.preprocessed_file = preprocessed;
            }
            if output.is_some() {
                config.output.packed_file = output;
            }
            cmd_pack(config)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only command output
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Merge a config file, if any, with command-line values
fn load_config(args: &AggregateArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let aggregator = &mut config.aggregator;
    if !args.headers.is_empty() {
        aggregator.headers = args.headers.clone();
    }
    if !args.include_paths.is_empty() {
        aggregator.include_search_paths = args.include_paths.clone();
    }
    aggregator.ignore_files.extend(args.ignore.iter().cloned());
    aggregator.validate()?;

    Ok(config)
}

fn cmd_aggregate(args: AggregateArgs, output: Option<&Path>) -> Result<()> {
    let config = load_config(&args)?;
    let aggregator = HeaderAggregator::from_config(&config.aggregator)?;

    let aggregation = aggregator
        .aggregate(&config.aggregator.headers, &config.aggregator.ignore_files)
        .context("Header aggregation failed")?;

    let output = output.or(config.output.aggregation_file.as_deref());
    write_output(&aggregation, output)?;
    info!(
        "Aggregated {} headers, {} lines",
        aggregation.headers.len(),
        aggregation.lines.len()
    );

    Ok(())
}

fn cmd_scrub(input: &Path, output: Option<&Path>) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin().lock()))
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let stats = scrub_stream(reader, &mut writer)?;
    info!(
        "Scrubbed {} lines to {} ({} markers removed)",
        stats.lines_read, stats.lines_written, stats.markers_removed
    );

    Ok(())
}

fn cmd_pack(config: Config) -> Result<()> {
    let packer = HeaderPacker::new(config)?;
    let report = packer.run().context("Header packing failed")?;

    println!("Aggregated {} headers ({} lines)", report.headers.len(), report.aggregated_lines);
    println!("   Aggregation: {}", report.artifacts.aggregation.display());
    if let Some(preprocessed) = &report.artifacts.preprocessed {
        println!("   Preprocessed: {}", preprocessed.display());
    }
    if let (Some(packed), Some(stats)) = (&report.artifacts.packed, &report.scrub) {
        println!(
            "   Packed: {} ({} of {} lines kept)",
            packed.display(),
            stats.lines_written,
            stats.lines_read
        );
    }

    Ok(())
}
