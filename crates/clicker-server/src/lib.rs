//! HTTP front end for the clicker economy engine.
//!
//! Routes requests onto [`clicker_core::ledger::Ledger`] runs, renders
//! states and errors as JSON, and answers CORS preflights. All game rules
//! live in `clicker-core`; this crate only moves bytes.

pub mod config;
pub mod routes;

use std::sync::Arc;

use clicker_core::ledger::Ledger;

use crate::config::{ConfigError, ServerConfig};
use crate::routes::{AppState, build_router, cors_layer};

/// Build the full application router from a config.
pub fn app(config: &ServerConfig) -> Result<axum::Router, ConfigError> {
    let ledger = Ledger::with_key(config.build_store(), config.player_key.clone());
    let state = AppState::new(Arc::new(ledger));
    Ok(build_router(state, cors_layer(&config.allow_origin)?))
}
