use std::sync::Arc;

use async_trait::async_trait;
use invoicer_core::events::JobEvent;
use invoicer_engine::EventSink;

use crate::ws::WsManager;

/// Forwards job events to one WebSocket connection.
///
/// Events for a connection that has gone away are dropped; the job keeps
/// running until it is ended or drains.
pub struct ConnectionSink {
    conn_id: String,
    ws_manager: Arc<WsManager>,
}

impl ConnectionSink {
    pub fn new(conn_id: impl Into<String>, ws_manager: Arc<WsManager>) -> Self {
        Self {
            conn_id: conn_id.into(),
            ws_manager,
        }
    }
}

#[async_trait]
impl EventSink for ConnectionSink {
    async fn emit(&self, event: JobEvent) {
        let delivered = self
            .ws_manager
            .send_json(&self.conn_id, &event.to_wire())
            .await;
        if !delivered {
            tracing::debug!(
                conn_id = %self.conn_id,
                event = event.event_name(),
                "Dropped job event for closed connection",
            );
        }
    }
}
