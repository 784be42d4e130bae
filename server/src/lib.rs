//! AirRoute Server Library
//!
//! Batch seeding and the HTTP API for AirRouteIQ route similarity, on top of
//! `airroute-vector`.

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod seed;

pub use api::{router, AppState};
pub use config::{Cli, Command, Settings};
pub use error::ApiError;
