/// Query builders for the map API
///
/// Turns validated tool arguments into upstream query parameters. Local
/// search is the only call with state: when a session id is present the
/// start offset comes from the pagination store.

use crate::domain::{
    DomainError, GeocodeParams, GeocodeQuery, LocalSearchParams, LocalSearchQuery,
    ReverseGeocodeParams, ReverseGeocodeQuery, OUTPUT_FORMAT,
};
use crate::storage::{PaginationStore, PagingKey};

/// Page size used when `results` is missing or not positive
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Effective page size for a requested `results` value
pub fn page_size(requested: Option<i64>) -> u32 {
    match requested {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// A local search query together with where it sits in the session
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLocalSearch {
    pub query: LocalSearchQuery,
    /// Zero-based offset of this page
    pub offset: u64,
    /// Offset of the following page, only for session-paged searches
    pub next_offset: Option<u64>,
}

/// Build the local search query, advancing the session cursor if any
///
/// Validation happens before the store is touched, so a rejected call never
/// moves a cursor.
pub fn build_local_search_query(
    params: &LocalSearchParams,
    api_key: &str,
    pagination: &PaginationStore,
) -> Result<BuiltLocalSearch, DomainError> {
    params.validate()?;
    let results = page_size(params.results);

    let (offset, next_offset) = match params.session_id() {
        Some(session_id) => {
            let key = PagingKey::new(session_id, params.fingerprint());
            let cursor = pagination.get_and_advance(
                &key,
                results,
                params.reset_requested(),
                params.explicit_offset(),
            );
            (cursor.offset, Some(cursor.next_offset))
        }
        None => (params.explicit_offset().unwrap_or(0), None),
    };

    let query = LocalSearchQuery {
        appid: api_key.to_string(),
        output: OUTPUT_FORMAT,
        query: params.query.clone().filter(|q| !q.is_empty()),
        lat: params.lat,
        lon: params.lng,
        start: offset + 1,
        results,
    };

    Ok(BuiltLocalSearch {
        query,
        offset,
        next_offset,
    })
}

pub fn build_geocode_query(params: &GeocodeParams, api_key: &str) -> Result<GeocodeQuery, DomainError> {
    params.validate()?;
    Ok(GeocodeQuery {
        appid: api_key.to_string(),
        output: OUTPUT_FORMAT,
        query: params.query.clone(),
    })
}

pub fn build_reverse_geocode_query(params: &ReverseGeocodeParams, api_key: &str) -> ReverseGeocodeQuery {
    ReverseGeocodeQuery {
        appid: api_key.to_string(),
        output: OUTPUT_FORMAT,
        lat: params.lat,
        lon: params.lng,
    }
}
