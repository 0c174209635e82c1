//! folio library
//!
//! Cached CoinGecko and GitHub lookups with an auto-refresh schedule. The
//! binary in `main.rs` is a thin shell over [`app::App`]; the modules are public
//! for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod refresh;
pub mod ui;
