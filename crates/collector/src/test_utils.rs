use async_trait::async_trait;
use slog::{o, Discard, Logger};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    default_observation_pages, DailySeries, Error, ForecastResponse, HourlySeries, LoadedPage,
    Location, PageSource,
};

pub fn logger() -> Logger {
    Logger::root(Discard, o!())
}

pub fn locations(count: usize) -> Vec<Location> {
    (0..count)
        .map(|i| Location {
            city: format!("City{}", i),
            district: format!("District{}", i),
            lat: format!("{}", 36.0 + i as f64 / 10.0),
            lng: "32.8".to_string(),
        })
        .collect()
}

pub fn locations_json(count: usize) -> String {
    let entries: Vec<serde_json::Value> = locations(count)
        .into_iter()
        .map(|l| {
            serde_json::json!({
                "sehir": l.city,
                "semt": l.district,
                "lat": l.lat,
                "lng": l.lng,
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

/// Two-day forecast whose first max temperature is `max_temp`
pub fn forecast(max_temp: f64) -> ForecastResponse {
    ForecastResponse {
        daily: DailySeries {
            temperature_2m_max: vec![Some(max_temp), Some(max_temp + 1.0)],
            temperature_2m_min: vec![Some(1.0), Some(2.0)],
            wind_speed_10m_max: vec![Some(10.0), Some(12.0)],
            precipitation_sum: vec![Some(0.0), Some(3.0)],
        },
        hourly: HourlySeries {
            cape: vec![Some(100.0); 48],
        },
    }
}

#[derive(Clone)]
pub enum FakeTable {
    Rows(Vec<Vec<String>>),
    ExtractFails,
    LoadFails,
}

#[derive(Default)]
pub struct FakeSource {
    pub tables: HashMap<String, FakeTable>,
    pub loads: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

pub struct FakePage {
    url: String,
    table: FakeTable,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PageSource for FakeSource {
    async fn load(&self, url: &str, _ready_selector: &str) -> Result<Box<dyn LoadedPage>, Error> {
        let table = self
            .tables
            .get(url)
            .cloned()
            .unwrap_or(FakeTable::LoadFails);
        if let FakeTable::LoadFails = table {
            return Err(Error::Scrape {
                url: url.to_string(),
                reason: "timed out".to_string(),
            });
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            url: url.to_string(),
            table,
            closes: self.closes.clone(),
        }))
    }
}

#[async_trait]
impl LoadedPage for FakePage {
    async fn extract_rows(
        &self,
        _row_selector: &str,
        _cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, Error> {
        match &self.table {
            FakeTable::Rows(rows) => Ok(rows.clone()),
            _ => Err(Error::Browser(format!("detached from {}", self.url))),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn row(city_info: &str, value: &str) -> Vec<String> {
    vec![city_info.to_string(), value.to_string()]
}

/// All three MGM tables, five distinct city/district keys
pub fn full_source() -> FakeSource {
    let pages = default_observation_pages();
    let mut source = FakeSource::default();
    source.tables.insert(
        pages[0].url.clone(),
        FakeTable::Rows(vec![
            row("Antalya, Manavgat", "38.1"),
            row("Ankara, Cankaya", "31.2"),
        ]),
    );
    source.tables.insert(
        pages[1].url.clone(),
        FakeTable::Rows(vec![
            row("Erzurum, Palandoken", "-4.0"),
            row("Ankara, Cankaya", "14.0"),
        ]),
    );
    source.tables.insert(
        pages[2].url.clone(),
        FakeTable::Rows(vec![
            row("Rize, Ardesen", "3,5"),
            row("Ankara, Cankaya", "0,2"),
            row("Artvin, Hopa", "48,6"),
        ]),
    );
    source
}
