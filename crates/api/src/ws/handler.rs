use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use invoicer_core::job::{JobId, JobStatus};
use invoicer_engine::JobRegistry;

use crate::bulk::{apply_control, start_bulk_invoice};
use crate::state::AppState;
use crate::ws::messages::{request_error, ClientMessage};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager` and
/// managed by a spawned sender task plus the receive loop.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Dispatches inbound messages on the current task.
///   4. On disconnect, ends the jobs this connection started and cleans up.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let mut started: HashSet<JobId> = HashSet::new();
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                dispatch(&state, &conn_id, text.as_str(), &mut started).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Nobody is left to observe or steer these jobs.
    for job_id in &started {
        if state.registry.set_status(job_id, JobStatus::Ended) {
            tracing::info!(conn_id = %conn_id, job_id = %job_id, "Ending job of disconnected client");
        }
    }

    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Act on one inbound text frame.
async fn dispatch(state: &AppState, conn_id: &str, text: &str, started: &mut HashSet<JobId>) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(conn_id, error = %e, "Unrecognized WebSocket message");
            state
                .ws_manager
                .send_json(conn_id, &request_error(format!("Invalid message: {e}")))
                .await;
            return;
        }
    };

    match message {
        ClientMessage::StartBulkInvoice(request) => {
            match start_bulk_invoice(state, conn_id, request).await {
                Ok(job_id) => track_started(&state.registry, started, job_id),
                Err(e) => {
                    tracing::warn!(conn_id, error = %e, "Bulk invoice job not started");
                    state
                        .ws_manager
                        .send_json(conn_id, &request_error(e.to_string()))
                        .await;
                }
            }
        }
        ClientMessage::JobControl(control) => {
            let job_id = JobId::new(conn_id, &control.profile_name, control.job_type);
            apply_control(&state.registry, &job_id, control.action);
        }
    }
}

/// Remember a job this connection started, forgetting those that finished.
fn track_started(registry: &JobRegistry, started: &mut HashSet<JobId>, job_id: JobId) {
    started.retain(|id| registry.get(id).is_some());
    started.insert(job_id);
}
