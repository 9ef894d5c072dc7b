use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

use crate::{WeatherRow, YesterdayRow};

/// Latest snapshot served to clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub today: Vec<WeatherRow>,
    pub tomorrow: Vec<WeatherRow>,
    pub yesterday: Vec<YesterdayRow>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.tomorrow.is_empty() && self.yesterday.is_empty()
    }
}

/// Where the loader publishes its progress. The serving layer owns the
/// implementation and reads back through `get`.
pub trait DatasetSink: Send + Sync {
    fn replace(&self, dataset: Dataset);
    fn get(&self) -> Dataset;
}

#[derive(Debug, Default)]
pub struct SharedDataset {
    inner: RwLock<Dataset>,
}

impl SharedDataset {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatasetSink for SharedDataset {
    fn replace(&self, dataset: Dataset) {
        // assignment is the only mutation, a poisoned lock still holds a whole Dataset
        let mut current = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *current = dataset;
    }

    fn get(&self) -> Dataset {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
