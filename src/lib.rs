//! Per-request language negotiation and translation for axum servers.
//!
//! See [`i18n`] for the resolution rules and [`middleware`] for wiring.

pub mod config;
pub mod i18n;
pub mod middleware;
pub mod server;
