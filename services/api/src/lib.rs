//! Podium API Library Crate
//!
//! This library contains all the logic for the Podium web service: configuration,
//! the application state, the session-record store, REST handlers, the
//! WebSocket practice-session controller and routing. The `api` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod records;
pub mod router;
pub mod state;
pub mod ws;
