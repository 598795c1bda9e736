// Region bank search against the Nominatim geocoding service
// One canonical external capability: free-text region in, a list of
// name/address records out. Results are ephemeral - printed, not persisted.

use crate::directory::LookupError;
use serde::Deserialize;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim requires an identifying agent for API traffic
const USER_AGENT: &str = concat!("ifsc-workbench/", env!("CARGO_PKG_VERSION"));

/// Shown when a place comes back without an address object
pub const ADDRESS_UNAVAILABLE: &str = "Address not available";

// ============================================================================
// RESPONSE CONTRACT
// ============================================================================

/// One place from the search response
#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,

    #[serde(default)]
    address: Option<PlaceAddress>,
}

#[derive(Debug, Deserialize, Default)]
struct PlaceAddress {
    #[serde(default)]
    road: Option<String>,

    #[serde(default)]
    city: Option<String>,

    #[serde(default)]
    state: Option<String>,

    #[serde(default)]
    country: Option<String>,
}

/// A bank/place hit for a region query
#[derive(Debug, Clone, PartialEq)]
pub struct RegionResult {
    pub name: String,
    pub address: String,
}

impl From<Place> for RegionResult {
    fn from(place: Place) -> Self {
        let address = match place.address {
            Some(addr) => {
                let parts: Vec<String> = [addr.road, addr.city, addr.state, addr.country]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect();

                if parts.is_empty() {
                    ADDRESS_UNAVAILABLE.to_string()
                } else {
                    parts.join(", ")
                }
            }
            None => ADDRESS_UNAVAILABLE.to_string(),
        };

        RegionResult {
            name: place.display_name,
            address,
        }
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Client for the region → banks search
pub struct RegionClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegionClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Point the client at a different search host (tests)
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(RegionClient {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Search for banks in a free-text region.
    ///
    /// A blank query is rejected before any request goes out - the console
    /// re-prompts on blank input and the API surface must not silently
    /// search for nothing.
    pub async fn banks_in(&self, region: &str) -> Result<Vec<RegionResult>, LookupError> {
        let region = region.trim();
        if region.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        let query = format!("bank in {}", region);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Network {
                message: format!("search answered {}", response.status()),
            });
        }

        let places = response.json::<Vec<Place>>().await.map_err(|e| {
            LookupError::InvalidResponse {
                message: e.to_string(),
            }
        })?;

        Ok(places.into_iter().map(RegionResult::from).collect())
    }
}

/// Keep results whose name or address mentions the token, case-insensitively
pub fn filter_by_region(results: Vec<RegionResult>, token: &str) -> Vec<RegionResult> {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return results;
    }

    results
        .into_iter()
        .filter(|result| {
            result.name.to_lowercase().contains(&token)
                || result.address.to_lowercase().contains(&token)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {
            "display_name": "State Bank of India, Sansad Marg, New Delhi, India",
            "address": {
                "road": "Sansad Marg",
                "city": "New Delhi",
                "state": "Delhi",
                "country": "India"
            }
        },
        {
            "display_name": "Canara Bank, Bengaluru"
        },
        {
            "display_name": "Axis Bank, MG Road",
            "address": {
                "road": "MG Road",
                "country": "India"
            }
        }
    ]"#;

    fn parse_fixture() -> Vec<RegionResult> {
        let places: Vec<Place> = serde_json::from_str(FIXTURE).unwrap();
        places.into_iter().map(RegionResult::from).collect()
    }

    #[test]
    fn test_places_parse_to_name_address_records() {
        let results = parse_fixture();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].name,
            "State Bank of India, Sansad Marg, New Delhi, India"
        );
        assert_eq!(
            results[0].address,
            "Sansad Marg, New Delhi, Delhi, India"
        );
    }

    #[test]
    fn test_missing_address_falls_back() {
        let results = parse_fixture();
        assert_eq!(results[1].address, ADDRESS_UNAVAILABLE);
    }

    #[test]
    fn test_partial_address_skips_absent_parts() {
        let results = parse_fixture();
        assert_eq!(results[2].address, "MG Road, India");
    }

    #[tokio::test]
    async fn test_blank_region_rejected_without_a_request() {
        let client = RegionClient::with_base_url("http://127.0.0.1:1/unreachable").unwrap();

        // Must fail fast with EmptyQuery, never touch the network
        assert!(matches!(
            client.banks_in("").await,
            Err(LookupError::EmptyQuery)
        ));
        assert!(matches!(
            client.banks_in("   ").await,
            Err(LookupError::EmptyQuery)
        ));
    }

    #[test]
    fn test_filter_by_region_matches_case_insensitively() {
        let results = parse_fixture();

        let delhi = filter_by_region(results.clone(), "new delhi");
        assert_eq!(delhi.len(), 1);
        assert_eq!(delhi[0].address, "Sansad Marg, New Delhi, Delhi, India");

        let all = filter_by_region(results.clone(), "");
        assert_eq!(all.len(), 3);

        let none = filter_by_region(results, "mumbai");
        assert!(none.is_empty());
    }
}
