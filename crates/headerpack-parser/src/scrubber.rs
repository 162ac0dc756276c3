//! Preprocessor Output Scrubber
//!
//! Removes the `# <line> "<file>"` markers the preprocessor interleaves with
//! real content, along with blank lines, to produce a compact text blob.

use headerpack_core::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{BufRead, Write};
use tracing::debug;

static LINE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(.*)# [0-9]+ "[^"]*"( *[0-9]+)?$"#).expect("line marker pattern is valid")
});

/// Counters collected while scrubbing a stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrubStats {
    pub lines_read: usize,
    pub lines_written: usize,
    pub markers_removed: usize,
}

/// Scrub a single line.
///
/// Returns `None` when nothing but whitespace remains after the line
/// marker, if any, is removed.
pub fn scrub_line(line: &str) -> Option<String> {
    scrub_line_inner(line).0
}

fn scrub_line_inner(line: &str) -> (Option<String>, bool) {
    let trimmed = line.trim();
    let (kept, had_marker) = match LINE_MARKER_RE.captures(trimmed) {
        Some(caps) => (caps.get(1).map_or("", |m| m.as_str()).trim(), true),
        None => (trimmed, false),
    };

    if kept.is_empty() {
        (None, had_marker)
    } else {
        (Some(kept.to_string()), had_marker)
    }
}

/// Scrub a sequence of lines
pub fn scrub<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| scrub_line(line.as_ref()))
        .collect()
}

/// Scrub everything `reader` yields into `writer`, one line per `\n`
pub fn scrub_stream<R: BufRead, W: Write>(reader: R, writer: &mut W) -> Result<ScrubStats> {
    let mut stats = ScrubStats::default();

    for line in reader.lines() {
        let line = line?;
        stats.lines_read += 1;

        let (kept, had_marker) = scrub_line_inner(&line);
        if had_marker {
            stats.markers_removed += 1;
        }
        if let Some(kept) = kept {
            writer.write_all(kept.as_bytes())?;
            writer.write_all(b"\n")?;
            stats.lines_written += 1;
        }
    }
    writer.flush()?;

    debug!(
        "Scrubbed {} lines to {} ({} markers removed)",
        stats.lines_read, stats.lines_written, stats.markers_removed
    );
    Ok(stats)
}
