//! Bulk job launching and control for connected clients.
//!
//! Jobs run as detached tasks and stream their events back to the
//! WebSocket connection that started them through a [`ConnectionSink`].

pub mod launcher;
pub mod progress;

pub use launcher::{apply_control, start_bulk_invoice};
pub use progress::ConnectionSink;
