use anyhow::anyhow;
use axum::serve;
use futures::TryFutureExt;
use log::{error, info};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, signal};
use weather_server::{
    app, build_app_state, build_loader, get_config_info, get_log_level, parse_schedule,
    run_refresh, run_schedule, setup_logger,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = get_config_info();
    let log_level = get_log_level(&cli);

    setup_logger()
        .level(log_level)
        .level_for("weather_server", log_level)
        .level_for("http_response", log_level)
        .level_for("http_request", log_level)
        .apply()?;

    let collector_logger = collector::setup_logger(cli.level.as_deref());
    let schedule = parse_schedule(&cli.schedule())?;

    let socket_addr = SocketAddr::from_str(&format!("{}:{}", cli.host(), cli.port()))
        .map_err(|e| anyhow!("invalid address: {}", e))?;

    let listener = TcpListener::bind(socket_addr)
        .map_err(|e| anyhow!("error binding to socket: {}", e))
        .await?;

    info!("Weather Feed starting...");
    info!("  Listen: http://{}", socket_addr);
    info!("  Static: {}", cli.static_dir());
    info!("  Locations: {}", cli.locations_file());
    info!("  Schedule: {}", cli.schedule());

    let app_state = build_app_state(cli.static_dir());
    let loader = Arc::new(
        build_loader(&cli, collector_logger, &app_state).map_err(|e| {
            error!("error building loader: {}", e);
            e
        })?,
    );

    tokio::spawn({
        let loader = loader.clone();
        let state = app_state.clone();
        async move { run_refresh(&loader, &state).await }
    });
    tokio::spawn(run_schedule(schedule, loader, app_state.clone()));

    serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
