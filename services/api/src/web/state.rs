//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use chrono::Duration;
use mentorship_core::{
    AccessGateway, BookingEngine, Clock, DatabaseService, SessionRegistry, TokenService,
};
use std::sync::Arc;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub gateway: AccessGateway,
    pub registry: Arc<SessionRegistry>,
    pub bookings: Arc<BookingEngine>,
}

impl AppState {
    /// Wires the core services around one storage adapter and one clock.
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        let tokens = Arc::new(
            TokenService::new(&config.token_secret)
                .with_ttl(Duration::days(config.token_ttl_days))
                .with_clock(clock.clone()),
        );
        Self {
            gateway: AccessGateway::new(tokens.clone()),
            registry: Arc::new(SessionRegistry::new(db.clone(), clock.clone())),
            bookings: Arc::new(BookingEngine::new(db.clone(), clock)),
            tokens,
            db,
            config,
        }
    }
}
