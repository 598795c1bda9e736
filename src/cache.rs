// Per-run result cache
// Cache-or-fetch discipline: the same code is validated once and fetched
// from the directory at most once per process run. Unbounded by design -
// input volume is assumed small, lifetime is one run.

use crate::directory::{BranchDetails, Directory, LookupError};
use std::collections::HashMap;

/// Memoizes validation outcomes and fetched branch details.
///
/// Owned explicitly by the caller (processor, console, server state)
/// rather than living in globals, so its lifetime is visible.
#[derive(Debug, Default)]
pub struct ResultCache {
    validity: HashMap<String, bool>,
    details: HashMap<String, BranchDetails>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation result for a code, computing and storing it on first sight
    pub fn get_or_validate(&mut self, code: &str, directory: &impl Directory) -> bool {
        if let Some(&known) = self.validity.get(code) {
            return known;
        }

        let valid = directory.validate(code);
        self.validity.insert(code.to_string(), valid);
        valid
    }

    /// Branch details for a code, fetching on first sight.
    ///
    /// Only successful fetches are stored, so a failed row can be retried
    /// later in the run (manual entry after a bulk failure, for instance).
    pub async fn get_or_fetch(
        &mut self,
        code: &str,
        directory: &impl Directory,
    ) -> Result<BranchDetails, LookupError> {
        if let Some(details) = self.details.get(code) {
            return Ok(details.clone());
        }

        let details = directory.fetch_details(code).await?;
        self.details.insert(code.to_string(), details.clone());
        Ok(details)
    }

    // ------------------------------------------------------------------
    // Plain accessors. The server handler cannot hold the cache lock
    // across an await, so it checks before the remote call and stores
    // after it through these.
    // ------------------------------------------------------------------

    pub fn cached_validity(&self, code: &str) -> Option<bool> {
        self.validity.get(code).copied()
    }

    pub fn cached_details(&self, code: &str) -> Option<BranchDetails> {
        self.details.get(code).cloned()
    }

    pub fn store_validity(&mut self, code: &str, valid: bool) {
        self.validity.insert(code.to_string(), valid);
    }

    pub fn store_details(&mut self, code: &str, details: BranchDetails) {
        self.details.insert(code.to_string(), details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::is_valid_code;
    use std::cell::Cell;

    /// Scripted directory with a call counter, so tests can assert a code
    /// is fetched at most once per run.
    struct MockDirectory {
        entries: HashMap<String, BranchDetails>,
        fetch_calls: Cell<usize>,
    }

    impl MockDirectory {
        fn new(entries: Vec<(&str, &str, &str)>) -> Self {
            let entries = entries
                .into_iter()
                .map(|(code, bank, branch)| {
                    (
                        code.to_string(),
                        BranchDetails {
                            bank: bank.to_string(),
                            branch: branch.to_string(),
                            address: None,
                            city: None,
                            state: None,
                        },
                    )
                })
                .collect();

            MockDirectory {
                entries,
                fetch_calls: Cell::new(0),
            }
        }
    }

    impl Directory for MockDirectory {
        fn validate(&self, code: &str) -> bool {
            is_valid_code(code)
        }

        async fn fetch_details(&self, code: &str) -> Result<BranchDetails, LookupError> {
            self.fetch_calls.set(self.fetch_calls.get() + 1);

            self.entries
                .get(code)
                .cloned()
                .ok_or_else(|| LookupError::NotFound {
                    code: code.to_string(),
                })
        }
    }

    #[test]
    fn test_validation_is_memoized() {
        let directory = MockDirectory::new(vec![]);
        let mut cache = ResultCache::new();

        assert!(cache.get_or_validate("SBIN0005943", &directory));
        assert!(cache.get_or_validate("SBIN0005943", &directory));
        assert!(!cache.get_or_validate("INVALID000", &directory));

        assert_eq!(cache.cached_validity("SBIN0005943"), Some(true));
        assert_eq!(cache.cached_validity("INVALID000"), Some(false));
        assert_eq!(cache.cached_validity("HDFC0000001"), None);
    }

    #[tokio::test]
    async fn test_same_code_fetched_at_most_once() {
        let directory = MockDirectory::new(vec![(
            "SBIN0005943",
            "State Bank of India",
            "Connaught Place",
        )]);
        let mut cache = ResultCache::new();

        let first = cache.get_or_fetch("SBIN0005943", &directory).await.unwrap();
        let second = cache.get_or_fetch("SBIN0005943", &directory).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(directory.fetch_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let directory = MockDirectory::new(vec![]);
        let mut cache = ResultCache::new();

        assert!(cache.get_or_fetch("SBIN0005943", &directory).await.is_err());
        assert!(cache.get_or_fetch("SBIN0005943", &directory).await.is_err());

        // Both attempts went to the directory - errors never populate the cache
        assert_eq!(directory.fetch_calls.get(), 2);
        assert!(cache.cached_details("SBIN0005943").is_none());
    }

    #[tokio::test]
    async fn test_store_then_get_skips_directory() {
        let directory = MockDirectory::new(vec![]);
        let mut cache = ResultCache::new();

        cache.store_details(
            "HDFC0000001",
            BranchDetails {
                bank: "HDFC Bank".to_string(),
                branch: "Fort".to_string(),
                address: None,
                city: None,
                state: None,
            },
        );

        let details = cache.get_or_fetch("HDFC0000001", &directory).await.unwrap();
        assert_eq!(details.bank, "HDFC Bank");
        assert_eq!(directory.fetch_calls.get(), 0);
    }
}
