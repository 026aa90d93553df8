/// Raw map API response shapes and their flattening
///
/// Only the handful of fields the flattened items need are typed; everything
/// else is left in the `raw` value handed back to clients.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    GeocodeItem, GeocodeResult, LocalSearchItem, LocalSearchResult, ReverseGeocodeItem,
    ReverseGeocodeResult,
};

/// Top level of every map API response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureCollection {
    pub feature: Option<Vec<Feature>>,
}

impl FeatureCollection {
    pub fn features(&self) -> &[Feature] {
        self.feature.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feature {
    pub name: Option<String>,
    pub geometry: Option<Geometry>,
    pub property: Option<Property>,
}

impl Feature {
    fn coordinates(&self) -> Coordinates {
        parse_coordinates(self.geometry.as_ref().and_then(|g| g.coordinates.as_deref()))
    }

    fn address(&self) -> Option<&str> {
        self.property.as_ref().and_then(|p| p.address.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Geometry {
    /// `"lng,lat"`
    pub coordinates: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Property {
    pub address: Option<String>,
    pub tel1: Option<String>,
    pub genre: Option<GenreField>,
}

/// Local search returns `Genre` as a list, older responses as a single object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GenreField {
    Many(Vec<Genre>),
    One(Genre),
}

impl GenreField {
    pub fn first_name(&self) -> Option<&str> {
        match self {
            GenreField::Many(genres) => genres.iter().find_map(|g| g.name.as_deref()),
            GenreField::One(genre) => genre.name.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Genre {
    pub name: Option<String>,
}

/// Latitude/longitude pair parsed from a `"lng,lat"` string
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Parse the map API's `"lng,lat"` coordinate string
///
/// Anything that is not exactly two comma-separated parts yields no
/// coordinates; a part that is not a finite number is dropped on its own.
pub fn parse_coordinates(raw: Option<&str>) -> Coordinates {
    let Some(raw) = raw else {
        return Coordinates::default();
    };
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        return Coordinates::default();
    }

    let parse = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    Coordinates {
        lng: parse(parts[0]),
        lat: parse(parts[1]),
    }
}

pub fn flatten_local_search(raw: Value) -> Result<LocalSearchResult, serde_json::Error> {
    let collection = FeatureCollection::deserialize(&raw)?;
    let items = collection
        .features()
        .iter()
        .map(|feature| {
            let coordinates = feature.coordinates();
            let property = feature.property.as_ref();
            LocalSearchItem {
                id: feature.name.clone(),
                name: feature.name.clone(),
                address: feature.address().map(str::to_owned),
                lat: coordinates.lat,
                lng: coordinates.lng,
                category: property
                    .and_then(|p| p.genre.as_ref())
                    .and_then(GenreField::first_name)
                    .map(str::to_owned),
                tel: property.and_then(|p| p.tel1.clone()),
            }
        })
        .collect();

    Ok(LocalSearchResult {
        items,
        next_offset: None,
        raw,
    })
}

pub fn flatten_geocode(raw: Value) -> Result<GeocodeResult, serde_json::Error> {
    let collection = FeatureCollection::deserialize(&raw)?;
    let items = collection
        .features()
        .iter()
        .map(|feature| {
            let coordinates = feature.coordinates();
            GeocodeItem {
                address: feature
                    .address()
                    .or(feature.name.as_deref())
                    .unwrap_or_default()
                    .to_string(),
                lat: coordinates.lat,
                lng: coordinates.lng,
                name: feature.name.clone(),
            }
        })
        .collect();

    Ok(GeocodeResult { items, raw })
}

pub fn flatten_reverse_geocode(raw: Value) -> Result<ReverseGeocodeResult, serde_json::Error> {
    let collection = FeatureCollection::deserialize(&raw)?;
    let items = collection
        .features()
        .iter()
        .map(|feature| ReverseGeocodeItem {
            address: feature.address().or(feature.name.as_deref()).map(str::to_owned),
            name: feature.name.clone(),
        })
        .collect();

    Ok(ReverseGeocodeResult { items, raw })
}
