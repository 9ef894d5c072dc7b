use anyhow::anyhow;
use chrono::{DateTime, Local};
use collector::{DatasetLoader, DatasetSink, RefreshOutcome};
use cron::Schedule;
use log::{debug, error, info, warn};
use std::{str::FromStr, sync::Arc, time::Duration};

use crate::AppState;

/// The `cron` crate wants a leading seconds field; plain five-field
/// expressions get it pinned to zero.
pub fn normalize_cron_expr(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

pub fn parse_schedule(expr: &str) -> Result<Schedule, anyhow::Error> {
    Schedule::from_str(&normalize_cron_expr(expr))
        .map_err(|e| anyhow!("invalid cron expression {:?}: {}", expr, e))
}

/// Time from `now` until the next occurrence, `None` once the schedule is
/// exhausted
pub fn next_delay(schedule: &Schedule, now: DateTime<Local>) -> Option<Duration> {
    let next = schedule.after(&now).next()?;
    (next - now).to_std().ok()
}

/// Runs one refresh and pushes the finished snapshot to WebSocket clients.
/// Failures are logged here, nothing is propagated.
pub async fn run_refresh(loader: &DatasetLoader, state: &AppState) {
    match loader.refresh().await {
        Ok(RefreshOutcome::Completed {
            today,
            tomorrow,
            yesterday,
        }) => {
            info!(
                "refresh completed: {} today, {} tomorrow, {} yesterday",
                today, tomorrow, yesterday
            );
            match serde_json::to_string(&state.dataset.get()) {
                Ok(snapshot) => {
                    // an error only means nobody is connected
                    if let Ok(receivers) = state.updates.send(snapshot) {
                        debug!("sent refreshed dataset to {} clients", receivers);
                    }
                }
                Err(e) => error!("error serializing dataset: {}", e),
            }
        }
        Ok(RefreshOutcome::AlreadyRunning) => {
            info!("refresh skipped, previous run still in progress")
        }
        Err(e) => error!("error refreshing weather data: {}", e),
    }
}

pub async fn run_schedule(schedule: Schedule, loader: Arc<DatasetLoader>, state: AppState) {
    loop {
        let Some(delay) = next_delay(&schedule, Local::now()) else {
            warn!("refresh schedule has no further occurrences, stopping scheduler");
            return;
        };
        info!("next scheduled refresh in {} seconds", delay.as_secs());
        tokio::time::sleep(delay).await;

        info!("running scheduled refresh");
        run_refresh(&loader, &state).await;
    }
}
