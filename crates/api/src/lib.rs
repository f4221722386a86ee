//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the expense ledger
//! - Authentication middleware
//! - The reminder runner driven by the server's scan loop

pub mod middleware;
pub mod reminders;
pub mod routes;

#[cfg(test)]
mod test_support;

use axum::Router;
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use splitledger_shared::JwtService;

use crate::reminders::{ReminderRunner, TracingReminderSink};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Timezone due dates are entered in.
    pub reminder_timezone: Tz,
    /// Reminder delivery, shared with the scan loop.
    pub reminders: Arc<ReminderRunner<TracingReminderSink>>,
}

impl AppState {
    /// Builds the state with the tracing-backed reminder sink.
    #[must_use]
    pub fn new(db: DatabaseConnection, jwt_service: JwtService, reminder_timezone: Tz) -> Self {
        let reminders = ReminderRunner::new(db.clone(), TracingReminderSink, reminder_timezone);
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            reminder_timezone,
            reminders: Arc::new(reminders),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
