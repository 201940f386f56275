//! Shared domain vocabulary for the bulk invoicer: job identity and control
//! state, progress/terminal events, connection profiles, and recipient
//! helpers. No I/O lives here.

pub mod error;
pub mod events;
pub mod job;
pub mod profile;
pub mod recipient;
pub mod types;
