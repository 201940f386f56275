//! Invoicer API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! WebSocket infrastructure, bulk job launching) so integration tests and
//! the binary entrypoint can both access them.

pub mod bulk;
pub mod config;
pub mod error;
pub mod handlers;
pub mod profiles;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
