//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use splitledger_shared::AppError;

use crate::{AppState, middleware::auth::auth_middleware};

pub mod expenses;
pub mod health;
pub mod notifications;
pub mod settlement;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Every ledger route is owner-scoped through the bearer token
    let protected_routes = Router::new()
        .merge(expenses::routes())
        .merge(settlement::routes())
        .merge(notifications::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// Builds the JSON error body `{ "error", "message", "details"? }` with the
/// status of the error's category.
pub(crate) fn error_response(err: &AppError, code: &str, details: Option<Value>) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = match err {
        AppError::Transient(_) => "A storage error occurred, please retry".to_string(),
        AppError::Internal(_) => "An error occurred".to_string(),
        AppError::Unauthorized(m)
        | AppError::NotFound(m)
        | AppError::Validation(m)
        | AppError::Conflict(m) => m.clone(),
    };

    let mut body = json!({
        "error": code.to_ascii_lowercase(),
        "message": message,
    });
    if let (Some(details), Some(map)) = (details, body.as_object_mut()) {
        map.insert("details".to_string(), details);
    }

    (status, Json(body)).into_response()
}
