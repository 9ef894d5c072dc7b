use futures::future::join_all;
use slog::{debug, error, info, warn, Logger};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::{merge_observation_row, Error, ObservationCategory, PageSource, YesterdayRow};

pub const ROW_SELECTOR: &str = "tr.ng-scope";
pub const CELL_SELECTOR: &str = "td.ng-binding";

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationPage {
    pub url: String,
    pub category: ObservationCategory,
}

/// The three "last 24 hours" tables published by MGM
pub fn default_observation_pages() -> Vec<ObservationPage> {
    vec![
        ObservationPage {
            url: String::from("https://mgm.gov.tr/sondurum/en-yuksek-sicakliklar.aspx"),
            category: ObservationCategory::MaxTemperature,
        },
        ObservationPage {
            url: String::from("https://mgm.gov.tr/sondurum/en-dusuk-sicakliklar.aspx"),
            category: ObservationCategory::MinTemperature,
        },
        ObservationPage {
            url: String::from("https://mgm.gov.tr/sondurum/toplam-yagis.aspx"),
            category: ObservationCategory::PrecipitationSum,
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedObservation {
    pub city_info: String,
    pub value: Option<f64>,
    pub category: ObservationCategory,
}

pub struct ObservationService {
    pub logger: Logger,
    pub source: Arc<dyn PageSource>,
    pub pages: Vec<ObservationPage>,
}

impl ObservationService {
    pub fn new(logger: Logger, source: Arc<dyn PageSource>, pages: Vec<ObservationPage>) -> Self {
        ObservationService {
            logger,
            source,
            pages,
        }
    }

    /// Scrapes one category table. The page is closed whether or not
    /// extraction succeeded.
    pub async fn scrape_category(
        &self,
        url: &str,
        row_selector: &str,
        category: ObservationCategory,
    ) -> Result<Vec<ScrapedObservation>, Error> {
        info!(self.logger, "scraping {} from {}", category, url);
        let page = self.source.load(url, row_selector).await?;
        let extracted = page.extract_rows(row_selector, CELL_SELECTOR).await;
        if let Err(err) = page.close().await {
            warn!(self.logger, "error closing page for {}: {}", url, err);
        }

        let observations: Vec<ScrapedObservation> = extracted?
            .into_iter()
            .filter_map(|cells| {
                let mut cells = cells.into_iter();
                match (cells.next(), cells.next()) {
                    (Some(city_info), Some(raw_value)) => Some(ScrapedObservation {
                        city_info: city_info.trim().to_string(),
                        value: category.parse_value(&raw_value),
                        category,
                    }),
                    _ => {
                        debug!(self.logger, "skipping row without two cells on {}", url);
                        None
                    }
                }
            })
            .collect();

        info!(
            self.logger,
            "scraped {} {} observations",
            observations.len(),
            category
        );
        Ok(observations)
    }

    /// Scrapes every category at once and folds the results into one row per
    /// city/district. Any category failing fails the whole scrape.
    pub async fn scrape_all(&self) -> Result<Vec<YesterdayRow>, Error> {
        let scrapes = self
            .pages
            .iter()
            .map(|page| self.scrape_category(&page.url, ROW_SELECTOR, page.category));

        let mut observations = Vec::new();
        for result in join_all(scrapes).await {
            match result {
                Ok(scraped) => observations.extend(scraped),
                Err(err) => {
                    error!(self.logger, "error scraping observations: {}", err);
                    return Err(err);
                }
            }
        }

        sort_precipitation_descending(&mut observations);

        let mut rows = Vec::new();
        for observation in &observations {
            merge_observation_row(
                &mut rows,
                &observation.city_info,
                observation.category,
                observation.value,
            );
        }
        Ok(rows)
    }
}

/// Reorders the precipitation entries among their own positions, wettest
/// first. Other categories stay where they are.
fn sort_precipitation_descending(observations: &mut [ScrapedObservation]) {
    let positions: Vec<usize> = observations
        .iter()
        .enumerate()
        .filter(|(_, o)| o.category == ObservationCategory::PrecipitationSum)
        .map(|(i, _)| i)
        .collect();

    let mut precipitation: Vec<ScrapedObservation> =
        positions.iter().map(|&i| observations[i].clone()).collect();
    precipitation.sort_by(|a, b| match (a.value, b.value) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    for (position, observation) in positions.into_iter().zip(precipitation) {
        observations[position] = observation;
    }
}
