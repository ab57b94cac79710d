use crate::app_state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// GET /ws/stock
///
/// Subscribes the client to the shared stock topic. Every product
/// create/update lands here as one JSON frame; the channel is lossy, so a
/// slow client skips frames instead of backpressuring writers.
pub async fn stock_feed(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    state.metrics.ws_clients.inc();
    let mut updates = state.notifier.subscribe();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    let frame = match serde_json::to_string(&update) {
                        Ok(json) => json,
                        Err(err) => {
                            warn!(?err, "Failed to encode stock update frame");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break; // client went away
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Stock feed subscriber lagged; frames dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // clients only listen; ignore chatter
                Some(Err(err)) => {
                    debug!(?err, "Stock feed socket error");
                    break;
                }
            },
        }
    }

    state.metrics.ws_clients.dec();
}
