//! Inventory API client library.
//!
//! - [`Gateway`]: the single-request seam, with [`HttpGateway`] as the
//!   production implementation over `reqwest`.
//! - [`InventoryClient`]: typed contact, invoice, email and organization
//!   operations bound to one profile.
//! - [`organization`]: the full-record update body for organization renames.

pub mod client;
pub mod gateway;
pub mod http;
pub mod organization;

pub use client::{InventoryClient, LineItem};
pub use gateway::{ApiError, Gateway, Method};
pub use http::HttpGateway;
