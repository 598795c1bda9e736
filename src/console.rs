// Interactive console - menu state machine over the workbench
// One pending prompt at a time: MENU → {MANUAL_ENTRY, REGION_SEARCH,
// VIEW_HISTORY} → MENU, looping until the user picks exit.

use anyhow::Result;
use ifsc_workbench::{
    cache::ResultCache,
    directory::Directory,
    region::RegionClient,
    sink::{self, CodeRecord, RecordSink},
};
use std::io::{self, Write};

/// Menu transitions. Parsing input is pure; the side effects live in
/// the matching ConsoleApp handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ManualEntry,
    RegionSearch,
    ViewHistory,
    Exit,
}

/// Map raw menu input to a transition, `None` for anything unrecognized
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::ManualEntry),
        "2" => Some(MenuChoice::RegionSearch),
        "3" => Some(MenuChoice::ViewHistory),
        "4" => Some(MenuChoice::Exit),
        _ => None,
    }
}

/// The console surface: owns the sink, the cache and both remote clients
/// for the lifetime of the session.
pub struct ConsoleApp<D: Directory> {
    directory: D,
    region: RegionClient,
    cache: ResultCache,
    sink: RecordSink,
}

impl<D: Directory> ConsoleApp<D> {
    pub fn new(directory: D, region: RegionClient, cache: ResultCache, sink: RecordSink) -> Self {
        ConsoleApp {
            directory,
            region,
            cache,
            sink,
        }
    }

    /// Menu loop; returns when the user picks exit
    pub async fn run(&mut self) -> Result<()> {
        loop {
            println!("\nSelect an option:");
            println!("1. Manually enter an IFSC code and add details to the output file");
            println!("2. Enter region name to fetch bank details");
            println!("3. View history from the output file");
            println!("4. Exit");

            let input = prompt("Enter your choice (1/2/3/4): ")?;

            match parse_choice(&input) {
                Some(MenuChoice::ManualEntry) => self.manual_entry().await?,
                Some(MenuChoice::RegionSearch) => self.region_search().await?,
                Some(MenuChoice::ViewHistory) => self.view_history(),
                Some(MenuChoice::Exit) => {
                    println!("Goodbye.");
                    return Ok(());
                }
                None => println!("Invalid choice. Please try again."),
            }
        }
    }

    async fn manual_entry(&mut self) -> Result<()> {
        let code = prompt("\nEnter the IFSC code to validate: ")?;

        if let Some(record) = self.record_manual_code(code.trim()).await? {
            println!(
                "{} added to {}.",
                record.ifsc,
                self.sink.path().display()
            );
        }

        Ok(())
    }

    /// Validate one manually entered code and, if it resolves, append a
    /// record to the sink.
    ///
    /// Returns `Ok(None)` when the code is invalid or the lookup failed -
    /// in both cases the sink is left untouched and the failure has
    /// already been reported.
    pub async fn record_manual_code(&mut self, code: &str) -> Result<Option<CodeRecord>> {
        if !self.cache.get_or_validate(code, &self.directory) {
            println!("Invalid IFSC code.");
            return Ok(None);
        }

        match self.cache.get_or_fetch(code, &self.directory).await {
            Ok(details) => {
                println!("\nBank: {}", details.bank);
                println!("Branch: {}", details.branch);
                if let Some(city) = &details.city {
                    println!("City: {}", city);
                }
                if let Some(state) = &details.state {
                    println!("State: {}", state);
                }

                let record = CodeRecord::valid(code, &details);
                self.sink.append(record.clone())?;
                Ok(Some(record))
            }
            Err(e) => {
                eprintln!("Error fetching details for the IFSC code: {}", e);
                Ok(None)
            }
        }
    }

    async fn region_search(&mut self) -> Result<()> {
        // Blank input re-prompts; anything else goes to the search client
        let region = loop {
            let input = prompt("\nEnter the region name (state) to fetch bank details: ")?;
            let trimmed = input.trim().to_lowercase();

            if trimmed.is_empty() {
                println!("No region provided. Please try again.");
                continue;
            }
            break trimmed;
        };

        println!("Fetching bank details for {}...", region);

        match self.region.banks_in(&region).await {
            Ok(results) if results.is_empty() => {
                println!("No banks found for {}.", region);
            }
            Ok(results) => {
                println!("\nBanks in {}:", region);
                for result in results {
                    println!("\nName: {}", result.name);
                    println!("Address: {}", result.address);
                    println!("----------------------");
                }
            }
            Err(e) => eprintln!("Error fetching bank details: {}", e),
        }

        Ok(())
    }

    fn view_history(&self) {
        // Re-read the document so history shows what is actually on disk
        match sink::load(self.sink.path()) {
            Ok(records) => {
                println!("\nIFSC Code History:");
                for (i, record) in records.iter().enumerate() {
                    println!(
                        "Row {}: IFSC={}, Bank={}, Branch={}, Status={}",
                        i + 1,
                        record.ifsc,
                        record.bank.as_deref().unwrap_or("-"),
                        record.branch.as_deref().unwrap_or("-"),
                        record.status.as_str()
                    );
                }
            }
            Err(e) => eprintln!(
                "Error reading history from {}: {}",
                self.sink.path().display(),
                e
            ),
        }
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
