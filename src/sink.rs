// Record sink - the persistent tabular store results are written to
// Appends happen in memory and the whole CSV document is re-serialized on
// every write, matching how the workbook surface behaves. One sink, one
// writer: callers sharing a sink across surfaces wrap it in a Mutex.

use crate::directory::BranchDetails;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker written into the BANK column for rows that failed validation
/// (spreadsheets carry a red fill here, CSV carries the text)
pub const INVALID_MARKER: &str = "Invalid IFSC";

/// Column order of the sink document
const SINK_HEADER: [&str; 4] = ["IFSC", "BANK", "BRANCH", "STATUS"];

// ============================================================================
// CODE RECORD
// ============================================================================

/// Outcome of a validation, VALID/INVALID on the wire and in the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeStatus {
    #[serde(rename = "VALID")]
    Valid,

    #[serde(rename = "INVALID")]
    Invalid,
}

impl CodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeStatus::Valid => "VALID",
            CodeStatus::Invalid => "INVALID",
        }
    }
}

/// One validated code with its derived fields.
///
/// Immutable once written to the sink. Invalid codes carry no details -
/// `bank`/`branch` stay `None` (the sink writes a marker into the BANK
/// column instead, see `SinkRow`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub ifsc: String,
    pub bank: Option<String>,
    pub branch: Option<String>,
    pub status: CodeStatus,
}

impl CodeRecord {
    /// Record for a code that validated and resolved against the directory
    pub fn valid(code: &str, details: &BranchDetails) -> Self {
        CodeRecord {
            ifsc: code.to_string(),
            bank: Some(details.bank.clone()),
            branch: Some(details.branch.clone()),
            status: CodeStatus::Valid,
        }
    }

    /// Record for a code that failed validation (or whose lookup failed)
    pub fn invalid(code: &str) -> Self {
        CodeRecord {
            ifsc: code.to_string(),
            bank: None,
            branch: None,
            status: CodeStatus::Invalid,
        }
    }
}

// ============================================================================
// CSV COLUMN MAPPING
// ============================================================================

/// On-disk row shape: IFSC, BANK, BRANCH, STATUS.
///
/// Invalid rows get the textual marker in the BANK cell, the closest a
/// CSV cell gets to a highlighted "Invalid IFSC" cell in a spreadsheet.
/// Loading maps the marker back to `bank: None`.
#[derive(Debug, Serialize, Deserialize)]
struct SinkRow {
    #[serde(rename = "IFSC")]
    ifsc: String,

    #[serde(rename = "BANK")]
    bank: String,

    #[serde(rename = "BRANCH")]
    branch: String,

    #[serde(rename = "STATUS")]
    status: CodeStatus,
}

impl From<&CodeRecord> for SinkRow {
    fn from(record: &CodeRecord) -> Self {
        let bank = match (&record.bank, record.status) {
            (Some(bank), _) => bank.clone(),
            (None, CodeStatus::Invalid) => INVALID_MARKER.to_string(),
            (None, CodeStatus::Valid) => String::new(),
        };

        SinkRow {
            ifsc: record.ifsc.clone(),
            bank,
            branch: record.branch.clone().unwrap_or_default(),
            status: record.status,
        }
    }
}

impl From<SinkRow> for CodeRecord {
    fn from(row: SinkRow) -> Self {
        let bank = if row.bank.is_empty() || row.bank == INVALID_MARKER {
            None
        } else {
            Some(row.bank)
        };
        let branch = if row.branch.is_empty() {
            None
        } else {
            Some(row.branch)
        };

        CodeRecord {
            ifsc: row.ifsc,
            bank,
            branch,
            status: row.status,
        }
    }
}

// ============================================================================
// RECORD SINK
// ============================================================================

/// CSV-backed sink holding the full record set in memory
pub struct RecordSink {
    path: PathBuf,
    records: Vec<CodeRecord>,
}

impl RecordSink {
    /// Start a fresh sink, truncating anything already at `path`.
    ///
    /// Writes the header immediately so an unwritable sink aborts the run
    /// at startup instead of after processing.
    pub fn create(path: &Path) -> Result<Self> {
        let sink = RecordSink {
            path: path.to_path_buf(),
            records: Vec::new(),
        };
        sink.flush()?;
        Ok(sink)
    }

    /// Open a sink, loading any records already on disk
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            let records = load(path)?;
            Ok(RecordSink {
                path: path.to_path_buf(),
                records,
            })
        } else {
            Self::create(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[CodeRecord] {
        &self.records
    }

    /// Append one record and re-serialize the whole document
    pub fn append(&mut self, record: CodeRecord) -> Result<()> {
        self.records.push(record);
        self.flush()
    }

    /// Replace the record set (bulk run) and re-serialize once
    pub fn write_all(&mut self, records: Vec<CodeRecord>) -> Result<()> {
        self.records = records;
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        // Header is written explicitly so an empty sink still yields a
        // well-formed document
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .with_context(|| format!("failed to open sink {}", self.path.display()))?;

        writer.write_record(SINK_HEADER)?;
        for record in &self.records {
            writer.serialize(SinkRow::from(record))?;
        }

        writer
            .flush()
            .with_context(|| format!("failed to write sink {}", self.path.display()))?;
        Ok(())
    }
}

/// Read a sink document back as records, in file order
pub fn load(path: &Path) -> Result<Vec<CodeRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to read sink {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<SinkRow>() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        records.push(row.into());
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(bank: &str, branch: &str) -> BranchDetails {
        BranchDetails {
            bank: bank.to_string(),
            branch: branch.to_string(),
            address: None,
            city: None,
            state: None,
        }
    }

    #[test]
    fn test_append_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut sink = RecordSink::create(&path).unwrap();
        sink.append(CodeRecord::valid(
            "SBIN0005943",
            &details("State Bank of India", "Connaught Place"),
        ))
        .unwrap();
        sink.append(CodeRecord::invalid("INVALID0000")).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].ifsc, "SBIN0005943");
        assert_eq!(loaded[0].bank.as_deref(), Some("State Bank of India"));
        assert_eq!(loaded[0].status, CodeStatus::Valid);
        assert_eq!(loaded[1].bank, None);
        assert_eq!(loaded[1].status, CodeStatus::Invalid);
    }

    #[test]
    fn test_invalid_rows_carry_marker_in_bank_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut sink = RecordSink::create(&path).unwrap();
        sink.append(CodeRecord::invalid("NOTACODE")).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(INVALID_MARKER));
        assert!(raw.contains("INVALID"));

        // The marker is presentation only - it loads back as no bank
        let loaded = load(&path).unwrap();
        assert_eq!(loaded[0].bank, None);
    }

    #[test]
    fn test_empty_sink_writes_header_only_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        RecordSink::create(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "IFSC,BANK,BRANCH,STATUS");
        assert_eq!(load(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_open_resumes_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        {
            let mut sink = RecordSink::create(&path).unwrap();
            sink.append(CodeRecord::valid("HDFC0000001", &details("HDFC Bank", "Fort")))
                .unwrap();
        }

        let sink = RecordSink::open(&path).unwrap();
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].ifsc, "HDFC0000001");
    }

    #[test]
    fn test_write_all_replaces_previous_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut sink = RecordSink::create(&path).unwrap();
        sink.append(CodeRecord::invalid("OLD")).unwrap();

        sink.write_all(vec![
            CodeRecord::valid("SBIN0005943", &details("State Bank of India", "CP")),
            CodeRecord::invalid("BAD"),
        ])
        .unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].ifsc, "SBIN0005943");
        assert_eq!(loaded[1].ifsc, "BAD");
    }

    #[test]
    fn test_create_truncates_stale_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        {
            let mut sink = RecordSink::create(&path).unwrap();
            sink.append(CodeRecord::invalid("STALE")).unwrap();
        }

        let sink = RecordSink::create(&path).unwrap();
        assert_eq!(sink.records().len(), 0);
        assert_eq!(load(&path).unwrap().len(), 0);
    }
}
