use crate::{weather_handler, ws_handler, Cli};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use collector::{
    default_observation_pages, ChromiumPageSource, DatasetLoader, ForecastClient,
    ForecastService, ObservationService, SharedDataset,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::info;
use slog::Logger;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};
use weather_feed_core::APP_NAME;

/// Snapshots waiting for a slow WebSocket client before it starts skipping
const UPDATE_CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct AppState {
    pub static_dir: String,
    pub dataset: Arc<SharedDataset>,
    /// Serialized dataset, sent after every completed refresh
    pub updates: broadcast::Sender<String>,
}

pub fn build_app_state(static_dir: String) -> AppState {
    let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
    AppState {
        static_dir,
        dataset: Arc::new(SharedDataset::new()),
        updates,
    }
}

/// Wires the forecast client and the browser-backed scraper into a loader
/// that publishes into `app_state.dataset`.
pub fn build_loader(
    cli: &Cli,
    logger: Logger,
    app_state: &AppState,
) -> Result<DatasetLoader, anyhow::Error> {
    let user_agent = format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION"));
    let client = ForecastClient::new(
        logger.clone(),
        cli.forecast_url(),
        &user_agent,
        Duration::from_secs(cli.request_timeout_secs()),
    )
    .map_err(|e| anyhow!("error setting up forecast client: {}", e))?;
    let forecasts = ForecastService::new(logger.clone(), Arc::new(client), cli.page_size());

    let pages = ChromiumPageSource::new(
        logger.clone(),
        cli.chrome_path.clone().map(PathBuf::from),
        Duration::from_secs(cli.scrape_timeout_secs()),
    );
    let observations =
        ObservationService::new(logger.clone(), Arc::new(pages), default_observation_pages());

    Ok(DatasetLoader::new(
        logger,
        PathBuf::from(cli.locations_file()),
        forecasts,
        observations,
        app_state.dataset.clone(),
        Duration::from_millis(cli.page_delay_ms()),
    ))
}

pub fn app(app_state: AppState) -> Router {
    let index_page = ServeFile::new(PathBuf::from(&app_state.static_dir).join("index.html"));
    let serve_static = ServeDir::new(&app_state.static_dir);
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/weather", get(weather_handler))
        .route("/ws", get(ws_handler))
        .with_state(Arc::new(app_state))
        .route_service("/", index_page)
        .fallback_service(serve_static)
        .layer(middleware::from_fn(log_request))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let started = time::OffsetDateTime::now_utc();
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    info!(target: "http_request", "new request, {} {}", method, path);

    let response = next.run(request).await;
    let elapsed = time::OffsetDateTime::now_utc() - started;
    info!(
        target: "http_response",
        "response, {} {} code: {}, time: {}",
        method,
        path,
        response.status().as_str(),
        elapsed
    );

    response
}
