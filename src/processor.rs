// Row processor - the bulk validate → enrich → record pipeline
// Straight-line iteration in input order, one row at a time: validate via
// the cache, fetch details via the cache, collect a record, report
// progress, then write the whole result set to the sink.

use crate::cache::ResultCache;
use crate::directory::Directory;
use crate::sink::{CodeRecord, RecordSink};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// One bar cell is added per this many processed rows
pub const PROGRESS_CADENCE: usize = 20;

/// Final counts for a bulk run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub total: usize,
    pub valid: usize,
}

impl ProcessSummary {
    pub fn invalid(&self) -> usize {
        self.total - self.valid
    }
}

/// Progress bar line redrawn in place while the pipeline runs
pub fn render_progress(count: usize, total: usize) -> String {
    let bar = "█".repeat(1 + count / PROGRESS_CADENCE);
    format!("{} Processed {} out of {}", bar, count, total)
}

/// Read codes from the input document: no header row, first column only
pub fn read_codes(input: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(input)
        .with_context(|| format!("failed to open input file {}", input.display()))?;

    let mut codes = Vec::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("failed to read {}", input.display()))?;
        codes.push(row.get(0).unwrap_or("").trim().to_string());
    }

    Ok(codes)
}

/// Run the pipeline over an input file and persist the results
pub async fn process_file(
    input: &Path,
    cache: &mut ResultCache,
    directory: &impl Directory,
    sink: &mut RecordSink,
) -> Result<ProcessSummary> {
    let codes = read_codes(input)?;
    process_codes(&codes, cache, directory, sink).await
}

/// Process codes in order, emitting progress and a final summary.
///
/// A row whose lookup fails is recorded as failed and the loop continues;
/// nothing is retried. The sink is rewritten once, after the last row.
pub async fn process_codes(
    codes: &[String],
    cache: &mut ResultCache,
    directory: &impl Directory,
    sink: &mut RecordSink,
) -> Result<ProcessSummary> {
    let total = codes.len();
    let mut records = Vec::with_capacity(total);
    let mut count = 0;
    let mut valid = 0;

    for code in codes {
        let record = if cache.get_or_validate(code, directory) {
            match cache.get_or_fetch(code, directory).await {
                Ok(details) => {
                    valid += 1;
                    CodeRecord::valid(code, &details)
                }
                Err(e) => {
                    eprintln!("\nError fetching details for {}: {}", code, e);
                    CodeRecord::invalid(code)
                }
            }
        } else {
            CodeRecord::invalid(code)
        };

        records.push(record);
        count += 1;

        print!("\r{}", render_progress(count, total));
        std::io::stdout().flush().ok();
    }

    if total > 0 {
        println!();
    }

    sink.write_all(records)
        .context("failed to write results to the output sink")?;

    let summary = ProcessSummary { total, valid };
    println!("\nValid: {}", summary.valid);
    println!("Invalid: {}", summary.invalid());

    Ok(summary)
}
