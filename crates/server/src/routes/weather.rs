use std::sync::Arc;

use axum::{extract::State, Json};
use collector::{Dataset, DatasetSink};

use crate::AppState;

/// Whatever the dataset currently holds, including a refresh in progress
pub async fn weather_handler(State(state): State<Arc<AppState>>) -> Json<Dataset> {
    Json(state.dataset.get())
}
