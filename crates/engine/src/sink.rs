//! Destination for the events a job emits.

use async_trait::async_trait;
use invoicer_core::events::JobEvent;
use tokio::sync::mpsc;

/// Receives every progress and terminal event of one job, in order.
///
/// Implementations must not block for long: the runner awaits each emit
/// before moving on.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: JobEvent);
}

/// Forward events into an unbounded channel. A closed channel drops them.
#[async_trait]
impl EventSink for mpsc::UnboundedSender<JobEvent> {
    async fn emit(&self, event: JobEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Job event receiver dropped, discarding event");
        }
    }
}
