use async_trait::async_trait;
use axum::Router;
use collector::{
    DatasetLoader, Error, ForecastApi, ForecastResponse, ForecastService, LoadedPage,
    ObservationCategory, ObservationPage, ObservationService, PageSource,
};
use slog::{o, Discard, Logger};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tempfile::TempDir;
use weather_server::{app, build_app_state, AppState};

pub const INDEX_HTML: &str = "<html><body>weather feed</body></html>";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub loader: Arc<DatasetLoader>,
    // dropped with the app
    pub _static_dir: TempDir,
}

/// Router, state and a loader backed by canned upstream data: three
/// locations sharing one forecast and a single observed city.
pub fn spawn_app() -> TestApp {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(static_dir.path().join("app.js"), "console.log('ok');").unwrap();
    std::fs::write(static_dir.path().join("locations.json"), LOCATIONS).unwrap();

    let state = build_app_state(static_dir.path().to_string_lossy().to_string());
    let logger = Logger::root(Discard, o!());
    let loader = DatasetLoader::new(
        logger.clone(),
        static_dir.path().join("locations.json"),
        ForecastService::new(logger.clone(), Arc::new(CannedForecast), 2),
        ObservationService::new(
            logger.clone(),
            Arc::new(CannedPages::new()),
            observation_pages(),
        ),
        state.dataset.clone(),
        Duration::ZERO,
    );

    TestApp {
        app: app(state.clone()),
        state,
        loader: Arc::new(loader),
        _static_dir: static_dir,
    }
}

const LOCATIONS: &str = r#"[
    {"sehir": "Ankara", "semt": "Cankaya", "lat": "39.9", "lng": "32.8"},
    {"sehir": "Izmir", "semt": "Bornova", "lat": 38.4, "lng": 27.2},
    {"sehir": "Van", "semt": "Ercis", "lat": "39.0", "lng": "43.3"}
]"#;

pub struct CannedForecast;

#[async_trait]
impl ForecastApi for CannedForecast {
    async fn fetch_one(&self, _lat: f64, _lng: f64) -> Option<ForecastResponse> {
        let raw = serde_json::json!({
            "daily": {
                "temperature_2m_max": [15.0, 20.0, 25.0],
                "temperature_2m_min": [5.0, 6.0, 7.0],
                "wind_speed_10m_max": [10.0, 11.0, 12.0],
                "precipitation_sum": [1.0, 2.0, 3.0]
            },
            "hourly": {"cape": vec![50.0; 72]}
        });
        serde_json::from_value(raw).ok()
    }
}

fn observation_pages() -> Vec<ObservationPage> {
    vec![
        ObservationPage {
            url: "http://mgm.test/max".to_string(),
            category: ObservationCategory::MaxTemperature,
        },
        ObservationPage {
            url: "http://mgm.test/min".to_string(),
            category: ObservationCategory::MinTemperature,
        },
        ObservationPage {
            url: "http://mgm.test/rain".to_string(),
            category: ObservationCategory::PrecipitationSum,
        },
    ]
}

pub struct CannedPages {
    tables: HashMap<String, Vec<Vec<String>>>,
}

impl CannedPages {
    fn new() -> Self {
        let cells = |info: &str, value: &str| vec![vec![info.to_string(), value.to_string()]];
        let mut tables = HashMap::new();
        tables.insert(
            "http://mgm.test/max".to_string(),
            cells("Ankara, Cankaya", "31.2"),
        );
        tables.insert(
            "http://mgm.test/min".to_string(),
            cells("Ankara, Cankaya", "14.0"),
        );
        tables.insert(
            "http://mgm.test/rain".to_string(),
            cells("Ankara, Cankaya", "0,2"),
        );
        CannedPages { tables }
    }
}

struct CannedPage(Vec<Vec<String>>);

#[async_trait]
impl PageSource for CannedPages {
    async fn load(&self, url: &str, _ready_selector: &str) -> Result<Box<dyn LoadedPage>, Error> {
        let rows = self.tables.get(url).cloned().ok_or_else(|| Error::Scrape {
            url: url.to_string(),
            reason: "unknown page".to_string(),
        })?;
        Ok(Box::new(CannedPage(rows)))
    }
}

#[async_trait]
impl LoadedPage for CannedPage {
    async fn extract_rows(
        &self,
        _row_selector: &str,
        _cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, Error> {
        Ok(self.0.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
