// IFSC Workbench - Core Library
// Exposes validation, directory lookup, caching, the record sink, the row
// pipeline and region search for use in the console binary, the API
// server, and tests

pub mod cache;
pub mod directory;
pub mod processor;
pub mod region;
pub mod sink;
pub mod validator;

// Re-export commonly used types
pub use cache::ResultCache;
pub use directory::{BranchDetails, Directory, IfscDirectory, LookupError};
pub use processor::{process_codes, process_file, ProcessSummary, PROGRESS_CADENCE};
pub use region::{filter_by_region, RegionClient, RegionResult};
pub use sink::{load as load_sink, CodeRecord, CodeStatus, RecordSink, INVALID_MARKER};
pub use validator::{is_valid_code, IFSC_LENGTH};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
