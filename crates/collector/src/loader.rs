use slog::{info, warn, Logger};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::{load_locations, Dataset, DatasetSink, Error, ForecastService, ObservationService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed {
        today: usize,
        tomorrow: usize,
        yesterday: usize,
    },
    /// Another refresh held the flag, nothing was done
    AlreadyRunning,
}

pub struct DatasetLoader {
    logger: Logger,
    locations_file: PathBuf,
    forecasts: ForecastService,
    observations: ObservationService,
    sink: Arc<dyn DatasetSink>,
    page_delay: Duration,
    running: AtomicBool,
}

/// Clears the running flag when the refresh ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DatasetLoader {
    pub fn new(
        logger: Logger,
        locations_file: PathBuf,
        forecasts: ForecastService,
        observations: ObservationService,
        sink: Arc<dyn DatasetSink>,
        page_delay: Duration,
    ) -> Self {
        DatasetLoader {
            logger,
            locations_file,
            forecasts,
            observations,
            sink,
            page_delay,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_start(&self) -> Option<RunningGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(&self.running))
    }

    /// Rebuilds the dataset from scratch: observations first, then forecast
    /// pages in order with `page_delay` between them. Progress is published to
    /// the sink after each step. Overlapping calls return `AlreadyRunning`.
    pub async fn refresh(&self) -> Result<RefreshOutcome, Error> {
        let Some(_guard) = self.try_start() else {
            info!(self.logger, "refresh already in progress, skipping");
            return Ok(RefreshOutcome::AlreadyRunning);
        };

        let started = Instant::now();
        info!(self.logger, "starting data refresh");
        let mut dataset = Dataset::default();
        self.sink.replace(dataset.clone());

        dataset.yesterday = self.observations.scrape_all().await?;
        self.sink.replace(dataset.clone());
        info!(
            self.logger,
            "loaded {} observation rows",
            dataset.yesterday.len()
        );

        let locations = load_locations(&self.locations_file).await?;
        info!(
            self.logger,
            "loaded {} locations from {}",
            locations.len(),
            self.locations_file.display()
        );

        let mut page = 1;
        loop {
            let rows = self.forecasts.fetch_page(&locations, page).await;
            if rows.today.is_empty() {
                let fetched_up_to = (page - 1) * self.forecasts.page_size;
                if fetched_up_to < locations.len() {
                    warn!(
                        self.logger,
                        "forecast page {} came back empty, stopping before {} remaining locations",
                        page,
                        locations.len() - fetched_up_to
                    );
                }
                break;
            }
            dataset.today.extend(rows.today);
            dataset.tomorrow.extend(rows.tomorrow);
            self.sink.replace(dataset.clone());

            page += 1;
            sleep(self.page_delay).await;
        }

        info!(
            self.logger,
            "data loading completed in {:?}: {} today, {} tomorrow, {} yesterday",
            started.elapsed(),
            dataset.today.len(),
            dataset.tomorrow.len(),
            dataset.yesterday.len()
        );
        Ok(RefreshOutcome::Completed {
            today: dataset.today.len(),
            tomorrow: dataset.tomorrow.len(),
            yesterday: dataset.yesterday.len(),
        })
    }
}
