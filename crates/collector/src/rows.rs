use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ForecastResponse, Location};

/// Forecast row for one location on one day, served as `today`/`tomorrow`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRow {
    pub city: String,
    pub district: String,
    pub lat: String,
    pub long: String,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_wind_speed: Option<f64>,
    pub max_cape: Option<f64>,
    pub prcp24h: Option<f64>,
    pub prcp48h: Option<f64>,
    pub prcp72h: Option<f64>,
}

/// Observed values for one city/district, filled in as each category is scraped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YesterdayRow {
    pub city: String,
    pub district: String,
    // left out of the JSON until the category has a value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prcp24h: Option<f64>,
}

impl YesterdayRow {
    fn new(city: &str, district: &str) -> Self {
        YesterdayRow {
            city: city.to_string(),
            district: district.to_string(),
            max_temp: None,
            min_temp: None,
            prcp24h: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationCategory {
    MaxTemperature,
    MinTemperature,
    PrecipitationSum,
}

impl ObservationCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ObservationCategory::MaxTemperature => "Max Temperature (C)",
            ObservationCategory::MinTemperature => "Min Temperature (C)",
            ObservationCategory::PrecipitationSum => "Precipitation Sum (mm)",
        }
    }

    /// Precipitation pages print a decimal comma ("12,4")
    pub fn parse_value(&self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        let parsed = match self {
            ObservationCategory::PrecipitationSum => raw.replacen(',', ".", 1).parse::<f64>(),
            _ => raw.parse::<f64>(),
        };
        parsed.ok().filter(|value| value.is_finite())
    }
}

impl fmt::Display for ObservationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Builds the row for `day_offset` days after the start of the series.
///
/// Negative offsets count back from the end of the daily series. Any index
/// the response does not cover comes out as `None` rather than panicking.
pub fn build_forecast_row(
    location: &Location,
    response: &ForecastResponse,
    day_offset: i32,
) -> WeatherRow {
    let daily = &response.daily;
    let base_index = if day_offset >= 0 {
        Some(day_offset as usize)
    } else {
        daily
            .temperature_2m_max
            .len()
            .checked_sub(day_offset.unsigned_abs() as usize)
    };

    let value_at = |series: &[Option<f64>], offset: usize| -> Option<f64> {
        base_index.and_then(|base| series.get(base + offset).copied().flatten())
    };

    let prcp24h = value_at(&daily.precipitation_sum, 0);
    let (prcp48h, prcp72h) = match prcp24h {
        Some(today) if day_offset >= 0 => {
            let next = value_at(&daily.precipitation_sum, 1).unwrap_or(0.0);
            let after_next = value_at(&daily.precipitation_sum, 2).unwrap_or(0.0);
            (Some(today + next), Some(today + next + after_next))
        }
        _ => (None, None),
    };

    WeatherRow {
        city: location.city.clone(),
        district: location.district.clone(),
        lat: location.lat.clone(),
        long: location.lng.clone(),
        max_temp: value_at(&daily.temperature_2m_max, 0),
        min_temp: value_at(&daily.temperature_2m_min, 0),
        max_wind_speed: value_at(&daily.wind_speed_10m_max, 0),
        max_cape: base_index.and_then(|base| max_cape(&response.hourly.cape, base)),
        prcp24h,
        prcp48h,
        prcp72h,
    }
}

/// Max of the 24 hourly cape values belonging to `day_index`. A day that the
/// hourly series does not fully cover has no value.
fn max_cape(cape: &[Option<f64>], day_index: usize) -> Option<f64> {
    let start = day_index.checked_mul(24)?;
    let day = cape.get(start..start.checked_add(24)?)?;
    day.iter().flatten().copied().reduce(f64::max)
}

/// Splits a "City, District" label on the first comma
pub fn split_city_info(city_info: &str) -> (&str, &str) {
    match city_info.split_once(',') {
        Some((city, district)) => (city.trim(), district.trim()),
        None => (city_info.trim(), ""),
    }
}

/// Sets `category` on the row keyed by the label's city and district, adding
/// the row on first sighting.
pub fn merge_observation_row(
    rows: &mut Vec<YesterdayRow>,
    city_info: &str,
    category: ObservationCategory,
    value: Option<f64>,
) {
    let (city, district) = split_city_info(city_info);
    let index = match rows
        .iter()
        .position(|row| row.city == city && row.district == district)
    {
        Some(index) => index,
        None => {
            rows.push(YesterdayRow::new(city, district));
            rows.len() - 1
        }
    };

    let row = &mut rows[index];
    match category {
        ObservationCategory::MaxTemperature => row.max_temp = value,
        ObservationCategory::MinTemperature => row.min_temp = value,
        ObservationCategory::PrecipitationSum => row.prcp24h = value,
    }
}
