/// reqwest-backed implementation of [`MapRepository`]

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    GeocodeQuery, GeocodeResult, LocalSearchQuery, LocalSearchResult, ReverseGeocodeQuery,
    ReverseGeocodeResult,
};
use crate::upstream::{
    flatten_geocode, flatten_local_search, flatten_reverse_geocode, MapRepository,
    UpstreamEndpoints, UpstreamError,
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Map repository talking to the Yahoo! map API over HTTPS
#[derive(Debug, Clone)]
pub struct YahooMapRepository {
    client: reqwest::Client,
    endpoints: UpstreamEndpoints,
}

impl YahooMapRepository {
    /// Build a client with the given per-request timeout
    pub fn new(endpoints: UpstreamEndpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &UpstreamEndpoints {
        &self.endpoints
    }

    /// GET `url` with `query` and parse the body as JSON
    ///
    /// Non-2xx answers become [`UpstreamError::Status`] carrying the body text.
    async fn fetch<Q: Serialize + ?Sized>(&self, url: &str, query: &Q) -> Result<Value, UpstreamError> {
        let transport = |source| UpstreamError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "map API returned an error status");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| UpstreamError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn decode_error(url: &str) -> impl FnOnce(serde_json::Error) -> UpstreamError + '_ {
        move |source| UpstreamError::Decode {
            url: url.to_string(),
            source,
        }
    }
}

#[async_trait]
impl MapRepository for YahooMapRepository {
    async fn local_search(&self, query: &LocalSearchQuery) -> Result<LocalSearchResult, UpstreamError> {
        let url = &self.endpoints.local_search;
        debug!(
            query = ?query.query,
            lat = ?query.lat,
            lon = ?query.lon,
            start = query.start,
            results = query.results,
            "calling local search"
        );

        let raw = self.fetch(url, query).await?;
        flatten_local_search(raw).map_err(Self::decode_error(url))
    }

    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeResult, UpstreamError> {
        let url = &self.endpoints.geocode;
        debug!(query = %query.query, "calling geocoder");

        let raw = self.fetch(url, query).await?;
        flatten_geocode(raw).map_err(Self::decode_error(url))
    }

    async fn reverse_geocode(
        &self,
        query: &ReverseGeocodeQuery,
    ) -> Result<ReverseGeocodeResult, UpstreamError> {
        let url = &self.endpoints.reverse_geocode;
        debug!(lat = query.lat, lon = query.lon, "calling reverse geocoder");

        let raw = self.fetch(url, query).await?;
        flatten_reverse_geocode(raw).map_err(Self::decode_error(url))
    }
}
