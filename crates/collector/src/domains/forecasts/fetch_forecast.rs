use async_trait::async_trait;
use futures::future::join_all;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use slog::{debug, error, info, warn, Logger};
use std::sync::Arc;
use std::time::Duration;

use crate::{build_forecast_row, page_of, Error, Location, WeatherRow};

/*
Fields requested from the forecast API:

Hourly convective available potential energy   cape
Maximum temperature (2 m)                      temperature_2m_max
Minimum temperature (2 m)                      temperature_2m_min
Maximum wind speed (10 m)                      wind_speed_10m_max
Precipitation sum                              precipitation_sum
*/
pub const HOURLY_FIELDS: [&str; 1] = ["cape"];
pub const DAILY_FIELDS: [&str; 4] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "wind_speed_10m_max",
    "precipitation_sum",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub daily: DailySeries,
    #[serde(default)]
    pub hourly: HourlySeries,
}

/// Daily values indexed by day, `None` where the API sent null
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
}

/// 24 entries per day
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub cape: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct ForecastRequest<'a> {
    pub latitude: f64,
    pub longitude: f64,
    pub query: ForecastQuery<'a>,
}

#[derive(Debug, Serialize)]
pub struct ForecastQuery<'a> {
    pub hourly: &'a [&'a str],
    pub daily: &'a [&'a str],
}

impl ForecastRequest<'static> {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        ForecastRequest {
            latitude,
            longitude,
            query: ForecastQuery {
                hourly: &HOURLY_FIELDS,
                daily: &DAILY_FIELDS,
            },
        }
    }
}

/// One forecast lookup per coordinate pair. A failed lookup is `None`; the
/// caller drops that location for the current cycle.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ForecastApi: Send + Sync {
    async fn fetch_one(&self, lat: f64, lng: f64) -> Option<ForecastResponse>;
}

pub struct ForecastClient {
    logger: Logger,
    url: String,
    client: Client,
}

impl ForecastClient {
    pub fn new(
        logger: Logger,
        url: String,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(ForecastClient {
            logger,
            url,
            client,
        })
    }

    async fn request(&self, lat: f64, lng: f64) -> Result<ForecastResponse, reqwest::Error> {
        debug!(self.logger, "requesting forecast for {},{}", lat, lng);
        self.client
            .post(&self.url)
            .json(&ForecastRequest::new(lat, lng))
            .send()
            .await?
            .error_for_status()?
            .json::<ForecastResponse>()
            .await
    }
}

#[async_trait]
impl ForecastApi for ForecastClient {
    async fn fetch_one(&self, lat: f64, lng: f64) -> Option<ForecastResponse> {
        match self.request(lat, lng).await {
            Ok(response) => Some(response),
            Err(err) => {
                error!(
                    self.logger,
                    "error making forecast request for {},{}: {}", lat, lng, err
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRows {
    pub today: Vec<WeatherRow>,
    pub tomorrow: Vec<WeatherRow>,
}

pub struct ForecastService {
    pub logger: Logger,
    pub api: Arc<dyn ForecastApi>,
    pub page_size: usize,
}

impl ForecastService {
    pub fn new(logger: Logger, api: Arc<dyn ForecastApi>, page_size: usize) -> Self {
        ForecastService {
            logger,
            api,
            page_size,
        }
    }

    /// Fetches every location of the 1-indexed `page` at once and builds its
    /// today/tomorrow rows in location order. Locations whose lookup failed
    /// are left out of both lists; an empty `today` means there are no more
    /// pages.
    pub async fn fetch_page(&self, locations: &[Location], page: usize) -> PageRows {
        let page_locations = page_of(locations, page, self.page_size);
        if page_locations.is_empty() {
            return PageRows::default();
        }

        let lookups = page_locations.iter().map(|location| async move {
            match location.coordinates() {
                Some((lat, lng)) => self.api.fetch_one(lat, lng).await,
                None => {
                    warn!(
                        self.logger,
                        "skipping {}, {}: invalid coordinates {},{}",
                        location.city,
                        location.district,
                        location.lat,
                        location.lng
                    );
                    None
                }
            }
        });
        let responses = join_all(lookups).await;

        let mut rows = PageRows::default();
        for (location, response) in page_locations.iter().zip(responses) {
            if let Some(response) = response {
                rows.today.push(build_forecast_row(location, &response, 0));
                rows.tomorrow.push(build_forecast_row(location, &response, 1));
            }
        }

        let failed = page_locations.len() - rows.today.len();
        info!(
            self.logger,
            "forecast page {}: {} locations, {} rows, {} failed",
            page,
            page_locations.len(),
            rows.today.len(),
            failed
        );
        rows
    }
}
