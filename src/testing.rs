/// In-memory map repository for unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::{
    GeocodeItem, GeocodeQuery, GeocodeResult, LocalSearchItem, LocalSearchQuery,
    LocalSearchResult, ReverseGeocodeItem, ReverseGeocodeQuery, ReverseGeocodeResult,
};
use crate::upstream::{MapRepository, UpstreamError};

/// Repository that answers with canned data and records local searches
#[derive(Debug, Default)]
pub struct FakeRepository {
    /// Fail every call with an HTTP 500
    pub fail: bool,
    /// Answer local searches with no items
    pub empty: bool,
    pub local_searches: Mutex<Vec<LocalSearchQuery>>,
}

impl FakeRepository {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn empty() -> Self {
        Self { empty: true, ..Default::default() }
    }

    /// `start` values of every local search seen so far
    pub fn starts(&self) -> Vec<u64> {
        self.local_searches.lock().unwrap().iter().map(|q| q.start).collect()
    }

    fn check(&self, url: &str) -> Result<(), UpstreamError> {
        if self.fail {
            return Err(UpstreamError::Status {
                status: 500,
                url: url.to_string(),
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MapRepository for FakeRepository {
    async fn local_search(&self, query: &LocalSearchQuery) -> Result<LocalSearchResult, UpstreamError> {
        self.local_searches.lock().unwrap().push(query.clone());
        self.check("fake://localSearch")?;

        let items = if self.empty {
            Vec::new()
        } else {
            vec![LocalSearchItem {
                id: Some(format!("place-{}", query.start)),
                name: Some(format!("place-{}", query.start)),
                ..Default::default()
            }]
        };
        Ok(LocalSearchResult {
            items,
            next_offset: None,
            raw: json!({"start": query.start}),
        })
    }

    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocodeResult, UpstreamError> {
        self.check("fake://geocode")?;
        Ok(GeocodeResult {
            items: vec![GeocodeItem {
                address: query.query.clone(),
                lat: Some(35.6812),
                lng: Some(139.7671),
                name: Some(query.query.clone()),
            }],
            raw: json!({}),
        })
    }

    async fn reverse_geocode(
        &self,
        query: &ReverseGeocodeQuery,
    ) -> Result<ReverseGeocodeResult, UpstreamError> {
        self.check("fake://reverseGeocode")?;
        Ok(ReverseGeocodeResult {
            items: vec![ReverseGeocodeItem {
                address: Some(format!("{},{}", query.lat, query.lon)),
                name: None,
            }],
            raw: json!({}),
        })
    }
}
