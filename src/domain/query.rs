/// Tool inputs and the upstream query parameters built from them
///
/// The `*Params` structs are what clients send as tool arguments (their JSON
/// schema is published through `tools/list`). The `*Query` structs are the
/// exact query strings sent to the map API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::DomainError;

/// Response format requested from the map API on every call
pub const OUTPUT_FORMAT: &str = "json";

/// Arguments accepted by the `localSearch` tool
///
/// Either `query` or both `lat` and `lng` must be present. The remaining
/// fields only control paging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalSearchParams {
    /// Keyword to search for
    pub query: Option<String>,
    /// Latitude for a coordinate search
    pub lat: Option<f64>,
    /// Longitude for a coordinate search
    pub lng: Option<f64>,
    /// Session id used to continue paging across calls
    pub session_id: Option<String>,
    /// Explicit zero-based offset (overrides the session cursor)
    pub offset: Option<i64>,
    /// Restart paging for this session and query
    pub reset: Option<bool>,
    /// Page size (defaults to 10)
    pub results: Option<i64>,
}

impl LocalSearchParams {
    /// Check that the search has something to search for
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.has_text_query() || (self.lat.is_some() && self.lng.is_some()) {
            Ok(())
        } else {
            Err(DomainError::validation("localSearch requires either query or lat+lng"))
        }
    }

    fn has_text_query(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.is_empty())
    }

    /// Identity of the logical search
    ///
    /// Only the text query and coordinates take part; paging controls
    /// (`sessionId`, `offset`, `reset`, `results`) never do.
    pub fn fingerprint(&self) -> String {
        json!({
            "q": self.query,
            "lat": self.lat,
            "lng": self.lng,
        })
        .to_string()
    }

    /// Session id, treating an empty string as absent
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Explicit offset, with negative values clamped to zero
    pub fn explicit_offset(&self) -> Option<u64> {
        self.offset.map(|offset| offset.max(0).unsigned_abs())
    }

    pub fn reset_requested(&self) -> bool {
        self.reset.unwrap_or(false)
    }
}

/// Arguments accepted by the `geocode` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeocodeParams {
    /// Address string to geocode
    pub query: String,
}

impl GeocodeParams {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.query.trim().is_empty() {
            return Err(DomainError::validation("geocode requires query"));
        }
        Ok(())
    }
}

/// Arguments accepted by the `reverseGeocode` tool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReverseGeocodeParams {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
}

/// Query string for the local search endpoint
///
/// `start` is 1-based, as the map API expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalSearchQuery {
    pub appid: String,
    pub output: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub start: u64,
    pub results: u32,
}

/// Query string for the geocoder endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeQuery {
    pub appid: String,
    pub output: &'static str,
    pub query: String,
}

/// Query string for the reverse geocoder endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseGeocodeQuery {
    pub appid: String,
    pub output: &'static str,
    pub lat: f64,
    pub lon: f64,
}
