use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use collector::DatasetSink;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Sends the current snapshot, then every refreshed snapshot until the client
/// goes away. Text from the client is only logged.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("websocket client connected");
    let mut updates = state.updates.subscribe();
    let (mut sender, mut receiver) = socket.split();

    let snapshot = match serde_json::to_string(&state.dataset.get()) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("error serializing dataset: {}", e);
            return;
        }
    };
    if let Err(e) = sender.send(Message::Text(snapshot.into())).await {
        warn!("error sending snapshot to websocket client: {}", e);
        return;
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => info!("received websocket message: {}", text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("websocket receive error: {}", e);
                    break;
                }
            },
            update = updates.recv() => match update {
                Ok(payload) => {
                    if sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("websocket client fell behind, skipped {} updates", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("websocket client disconnected");
}
