// 🏦 IFSC Directory - validation + remote branch lookup
// The directory is a pluggable capability so tests can swap the remote
// source for a mock (see ResultCache and RowProcessor tests).

use crate::validator;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default base URL of the public IFSC directory
const DIRECTORY_BASE_URL: &str = "https://ifsc.razorpay.com";

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Failures from the remote lookup clients.
///
/// A malformed code is NOT an error - validation is a boolean outcome.
/// These cover the remote side: the directory had no entry, the transport
/// failed, or the response could not be decoded.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The directory has no entry for this code
    #[error("no directory entry for code {code}")]
    NotFound { code: String },

    /// Transport-level failure (DNS, connect, TLS, non-success status)
    #[error("directory request failed: {message}")]
    Network { message: String },

    /// The remote answered with something we could not decode
    #[error("unexpected response from directory: {message}")]
    InvalidResponse { message: String },

    /// A search was attempted with a blank query string
    #[error("empty search query")]
    EmptyQuery,
}

impl From<reqwest::Error> for LookupError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            LookupError::InvalidResponse {
                message: error.to_string(),
            }
        } else {
            LookupError::Network {
                message: error.to_string(),
            }
        }
    }
}

// ============================================================================
// BRANCH DETAILS
// ============================================================================

/// Metadata the directory returns for a valid code.
///
/// The directory serves upper-case JSON keys; only bank and branch are
/// persisted to the sink, the rest is shown on manual lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchDetails {
    #[serde(rename = "BANK")]
    pub bank: String,

    #[serde(rename = "BRANCH")]
    pub branch: String,

    #[serde(rename = "ADDRESS", default)]
    pub address: Option<String>,

    #[serde(rename = "CITY", default)]
    pub city: Option<String>,

    #[serde(rename = "STATE", default)]
    pub state: Option<String>,
}

// ============================================================================
// DIRECTORY CAPABILITY
// ============================================================================

/// The validate + fetch capability every surface goes through.
///
/// Callers must pre-filter: `fetch_details` is only defined for codes that
/// passed `validate`. Implementations do not retry.
#[allow(async_fn_in_trait)]
pub trait Directory {
    /// Structural check, pure and side-effect free
    fn validate(&self, code: &str) -> bool;

    /// Fetch bank + branch metadata for an already-validated code
    async fn fetch_details(&self, code: &str) -> Result<BranchDetails, LookupError>;
}

/// Live client for the public IFSC directory
pub struct IfscDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl IfscDirectory {
    pub fn new() -> Self {
        Self::with_base_url(DIRECTORY_BASE_URL)
    }

    /// Point the client at a different directory host (tests)
    pub fn with_base_url(base_url: &str) -> Self {
        IfscDirectory {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for IfscDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory for IfscDirectory {
    fn validate(&self, code: &str) -> bool {
        validator::is_valid_code(code)
    }

    async fn fetch_details(&self, code: &str) -> Result<BranchDetails, LookupError> {
        let url = format!("{}/{}", self.base_url, code);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound {
                code: code.to_string(),
            });
        }

        if !response.status().is_success() {
            return Err(LookupError::Network {
                message: format!("directory answered {}", response.status()),
            });
        }

        let details = response.json::<BranchDetails>().await.map_err(|e| {
            LookupError::InvalidResponse {
                message: e.to_string(),
            }
        })?;

        Ok(details)
    }
}
