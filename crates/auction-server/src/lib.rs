//! auction-server
//!
//! Multi-client async TCP backend for the auction platform.

pub mod config;
pub mod types;
pub mod router;
pub mod notify;
pub mod server;

// these are internal modules, not re-exported
mod client;
mod event_task;
