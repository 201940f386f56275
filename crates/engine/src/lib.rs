//! Bulk invoice job engine.
//!
//! - [`JobRegistry`]: shared control state (`running` / `paused` /
//!   `ended`) for every live job.
//! - [`delay`]: cancellable waits between steps and items.
//! - [`InvoicePipeline`]: contact → invoice → notification for one item.
//! - [`BulkRunner`]: drives the pipeline over a recipient list under
//!   operator control and emits exactly one terminal event.
//! - [`single`]: the one-off, single-recipient variant.
//! - [`organization`]: read and rename a profile's organization.

pub mod delay;
pub mod error;
pub mod organization;
pub mod pipeline;
pub mod registry;
pub mod runner;
pub mod single;
pub mod sink;

pub use error::JobError;
pub use pipeline::{InvoicePipeline, InvoiceTemplate, ItemOutcome};
pub use registry::JobRegistry;
pub use runner::{BulkInvoiceJob, BulkRunner, JobReport, JobSummary, RunningJob};
pub use sink::EventSink;
