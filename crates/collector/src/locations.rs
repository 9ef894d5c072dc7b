use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::Error;

/// One entry of the location list, coordinates kept in the textual form they
/// were provided in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    #[serde(alias = "sehir")]
    pub city: String,
    #[serde(alias = "semt")]
    pub district: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lat: String,
    #[serde(alias = "lon", alias = "long", deserialize_with = "string_or_number")]
    pub lng: String,
}

impl Location {
    /// Parsed (latitude, longitude), `None` when either value is not a number
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lng = self.lng.trim().parse::<f64>().ok()?;
        Some((lat, lng))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

pub fn parse_locations(raw: &str) -> Result<Vec<Location>, Error> {
    Ok(serde_json::from_str(raw)?)
}

/// Reads the whole location list, any read or parse failure is returned as-is
pub async fn load_locations(path: impl AsRef<Path>) -> Result<Vec<Location>, Error> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_locations(&raw)
}

/// 1-indexed page of `page_size` locations, empty when the page is out of range
pub fn page_of(locations: &[Location], page: usize, page_size: usize) -> &[Location] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= locations.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(locations.len());
    &locations[start..end]
}
