/// Access to the Yahoo! map API
///
/// Tools talk to the map API through the [`MapRepository`] trait so the
/// network client can be swapped for a fake in tests.

pub mod raw;
pub mod yahoo;

pub use raw::*;
pub use yahoo::YahooMapRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    GeocodeQuery, GeocodeResult, LocalSearchQuery, LocalSearchResult, ReverseGeocodeQuery,
    ReverseGeocodeResult,
};

pub const DEFAULT_LOCAL_SEARCH_URL: &str = "https://map.yahooapis.jp/search/local/V1/localSearch";
pub const DEFAULT_GEOCODE_URL: &str = "https://map.yahooapis.jp/geocode/V1/geoCoder";
pub const DEFAULT_REVERSE_GEOCODE_URL: &str = "https://map.yahooapis.jp/geocode/V1/reverseGeoCoder";

/// Endpoint URLs of the three map API calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    pub local_search: String,
    pub geocode: String,
    pub reverse_geocode: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            local_search: DEFAULT_LOCAL_SEARCH_URL.to_string(),
            geocode: DEFAULT_GEOCODE_URL.to_string(),
            reverse_geocode: DEFAULT_REVERSE_GEOCODE_URL.to_string(),
        }
    }
}

/// Errors that can occur while calling the map API
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String, body: String },

    #[error("HTTP error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Upstream map operations the tools depend on
///
/// Each call performs exactly one HTTP GET and returns the flattened result.
/// Failures are passed through as-is; nothing here retries.
#[async_trait]
pub trait MapRepository: Send + Sync {
    async fn local_search(&self, query: &LocalSearchQuery) -> Result<LocalSearchResult, UpstreamError>;

    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeResult, UpstreamError>;

    async fn reverse_geocode(
        &self,
        query: &ReverseGeocodeQuery,
    ) -> Result<ReverseGeocodeResult, UpstreamError>;
}
