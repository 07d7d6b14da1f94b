//! # Backend Module
//!
//! Contains all non-UI logic of the budget tracker.
//!
//! ## Architecture
//!
//! ```text
//! Web frontend
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (validation, aggregation, session synchronizer)
//!     ↓
//! Storage Layer (hosted tables or local snapshot files)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Build the configured store and the services on top of it
//! - Set up the REST router with CORS for the frontend origin

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{AppConfig, ServerConfig};
use domain::{CalendarService, CalendarTimezone, ExpenseSynchronizer, InactivityMonitor};
use io::rest;
use storage::{build_store, ExpenseStore};

/// Main application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub synchronizer: ExpenseSynchronizer,
    pub calendar_service: CalendarService,
    pub inactivity: Arc<InactivityMonitor>,
    pub timezone: CalendarTimezone,
    pub daily_window_days: usize,
}

impl AppState {
    /// Wire services around `store`; spawns the inactivity watcher, so it
    /// must run inside a tokio runtime
    pub fn new(store: Arc<dyn ExpenseStore>, config: &AppConfig) -> Self {
        let synchronizer = ExpenseSynchronizer::new(store);
        let inactivity = InactivityMonitor::spawn(synchronizer.clone(), config.session.inactivity_timeout());
        info!("Signing out after {:?} without activity", inactivity.timeout());
        Self {
            synchronizer,
            calendar_service: CalendarService::new(),
            inactivity: Arc::new(inactivity),
            timezone: config.analytics.timezone,
            daily_window_days: config.analytics.daily_window_days,
        }
    }

    /// Today's date in the configured calendar time zone
    pub fn today(&self) -> NaiveDate {
        self.timezone.today()
    }
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up storage");
    let store = build_store(&config.storage, config.analytics.timezone)?;

    info!("Setting up application state ({} store)", store.name());
    Ok(AppState::new(store, config))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, server: &ServerConfig) -> Result<Router> {
    let origin = server
        .allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed_origin '{}'", server.allowed_origin))?;

    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/session", rest::session_apis::router())
        .nest("/expenses", rest::expense_apis::router())
        .nest("/goal", rest::goal_apis::router())
        .nest("/analytics", rest::analytics_apis::router())
        .nest("/calendar", rest::calendar_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
