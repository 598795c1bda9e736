// Console module is only used by this binary
mod console;

use anyhow::{Context, Result};
use ifsc_workbench::{
    cache::ResultCache, directory::IfscDirectory, processor, region::RegionClient,
    sink::RecordSink,
};
use std::env;
use std::path::{Path, PathBuf};

/// Input document read on startup unless a path is given on the command line
const DEFAULT_INPUT: &str = "sample.csv";

/// The output sink every surface appends to
const OUTPUT_SINK: &str = "output.csv";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let input = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

    println!("🏦 IFSC Workbench");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if !input.exists() {
        eprintln!("❌ Input file not found: {}", input.display());
        eprintln!("   Provide a CSV with IFSC codes in the first column:");
        eprintln!("   ifsc-workbench <input.csv>");
        std::process::exit(1);
    }

    let directory = IfscDirectory::new();
    let region = RegionClient::new().context("failed to build the region search client")?;
    let mut cache = ResultCache::new();
    let mut sink = RecordSink::create(Path::new(OUTPUT_SINK))
        .with_context(|| format!("failed to open the output sink {}", OUTPUT_SINK))?;

    println!("\nReading {}...", input.display());
    processor::process_file(&input, &mut cache, &directory, &mut sink)
        .await
        .context("error processing the input file")?;

    println!("\nProcessing completed. Results written to {}.", OUTPUT_SINK);

    // Hand everything to the menu loop - same cache, same sink
    let mut app = console::ConsoleApp::new(directory, region, cache, sink);
    app.run().await
}
