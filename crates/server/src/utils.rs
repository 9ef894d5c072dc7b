use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::env;
use time::{format_description::well_known::Iso8601, OffsetDateTime};
use weather_feed_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_FORECAST_URL, DEFAULT_LOCATIONS_FILE,
    DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_SCHEDULE,
};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather Feed - Aggregates forecasts and observations and serves them over HTTP and WebSocket"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WEATHER_FEED_CONFIG, ./weather-feed.toml,
    /// $XDG_CONFIG_HOME/weather-feed/weather-feed.toml, /etc/weather-feed/weather-feed.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WEATHER_FEED_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(long, env = "WEATHER_FEED_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory served for `/` and static assets
    #[arg(short, long, env = "WEATHER_FEED_STATIC_DIR")]
    pub static_dir: Option<String>,

    /// JSON list of locations to request forecasts for
    #[arg(long, env = "WEATHER_FEED_LOCATIONS_FILE")]
    pub locations_file: Option<String>,

    /// Forecast API endpoint
    #[arg(long, env = "WEATHER_FEED_FORECAST_URL")]
    pub forecast_url: Option<String>,

    /// Locations requested concurrently per forecast page
    #[arg(long, env = "WEATHER_FEED_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Pause between forecast pages in milliseconds
    #[arg(long, env = "WEATHER_FEED_PAGE_DELAY_MS")]
    pub page_delay_ms: Option<u64>,

    /// Cron expression for the scheduled refresh, server local time
    #[arg(long, env = "WEATHER_FEED_SCHEDULE")]
    pub schedule: Option<String>,

    /// Timeout for a single forecast request in seconds
    #[arg(long, env = "WEATHER_FEED_REQUEST_TIMEOUT")]
    pub request_timeout_secs: Option<u64>,

    /// How long to wait for an observation table to render, in seconds
    #[arg(long, env = "WEATHER_FEED_SCRAPE_TIMEOUT")]
    pub scrape_timeout_secs: Option<u64>,

    /// Chrome/Chromium executable used for scraping, auto-detected when unset
    #[arg(long, env = "WEATHER_FEED_CHROME_PATH")]
    pub chrome_path: Option<String>,
}

impl Cli {
    pub fn host(&self) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn static_dir(&self) -> String {
        self.static_dir
            .clone()
            .unwrap_or_else(|| "./public".to_string())
    }

    pub fn locations_file(&self) -> String {
        self.locations_file
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATIONS_FILE.to_string())
    }

    pub fn forecast_url(&self) -> String {
        self.forecast_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string())
    }

    /// Zero would never yield a page, so it falls back to the default
    pub fn page_size(&self) -> usize {
        self.page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn page_delay_ms(&self) -> u64 {
        self.page_delay_ms.unwrap_or(DEFAULT_PAGE_DELAY_MS)
    }

    pub fn schedule(&self) -> String {
        self.schedule
            .clone()
            .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string())
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(30)
    }

    pub fn scrape_timeout_secs(&self) -> u64 {
        self.scrape_timeout_secs.unwrap_or(30)
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("WEATHER_FEED_CONFIG", "weather-feed.toml")
    };

    if let Some(path) = source.path() {
        log::info!("Loading config from: {}", path.display());
    }

    let file_config: Cli = load_config(&source).unwrap_or_default();
    merge_config(cli_args, file_config)
}

/// CLI args (env vars are handled by clap) override the config file
fn merge_config(cli_args: Cli, file_config: Cli) -> Cli {
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        host: cli_args.host.or(file_config.host),
        port: cli_args.port.or(file_config.port),
        static_dir: cli_args.static_dir.or(file_config.static_dir),
        locations_file: cli_args.locations_file.or(file_config.locations_file),
        forecast_url: cli_args.forecast_url.or(file_config.forecast_url),
        page_size: cli_args.page_size.or(file_config.page_size),
        page_delay_ms: cli_args.page_delay_ms.or(file_config.page_delay_ms),
        schedule: cli_args.schedule.or(file_config.schedule),
        request_timeout_secs: cli_args
            .request_timeout_secs
            .or(file_config.request_timeout_secs),
        scrape_timeout_secs: cli_args
            .scrape_timeout_secs
            .or(file_config.scrape_timeout_secs),
        chrome_path: cli_args.chrome_path.or(file_config.chrome_path),
    }
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let timestamp = OffsetDateTime::now_utc()
                .format(&Iso8601::DEFAULT)
                .unwrap_or_default();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                timestamp,
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
