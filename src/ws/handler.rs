//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_watch;
use crate::app_state::AppState;

/// `GET /api/v1/watch`: Upgrade to a watch stream.
///
/// The connection receives one event immediately and one per subsequent
/// inventory change until either side closes it or the daemon shuts down.
pub async fn watch_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let broker = state.broker.clone();
    let cancel = state.shutdown.child_token();

    ws.on_upgrade(move |socket| run_watch(socket, broker, cancel))
}
