//! membersync-api
//!
//! Reconciles payment events from the processor with member records in the
//! membership platform, and builds promo-aware checkout sessions.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod clients;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub services: AppServices,
}

impl AppState {
    /// Wire the full application state from configuration, constructing the
    /// shared HTTP client and the outbound API clients once.
    pub fn from_config(config: config::AppConfig) -> Result<Self, errors::ServiceError> {
        let http = clients::build_http_client(config.http_timeout_secs)?;

        let payments = Arc::new(clients::SquareClient::new(
            http.clone(),
            config.square_base_url.clone(),
            config.square_access_token.clone(),
        ));
        let membership = Arc::new(clients::MemberstackClient::new(
            http.clone(),
            config.memberstack_base_url.clone(),
            config.memberstack_secret.clone(),
        ));
        let promo_table = Arc::new(clients::SheetPromoTable::new(
            http,
            config.promo_table_url.clone(),
        ));

        let services = AppServices::new(&config, payments, membership, promo_table);
        Ok(Self { config, services })
    }
}

/// Build the application router with request tracing applied.
pub fn app(state: AppState) -> Router {
    handlers::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
