//! Fixtures for handler tests.

use axum::response::Response;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use splitledger_shared::{JwtConfig, JwtService};
use uuid::Uuid;

use crate::AppState;

/// State with no database behind it; every query fails as a storage error.
pub fn test_state() -> AppState {
    AppState::new(
        DatabaseConnection::Disconnected,
        JwtService::new(&JwtConfig {
            secret: "handler-test-secret".to_string(),
            access_token_expiry_secs: 900,
        }),
        chrono_tz::UTC,
    )
}

/// `Authorization` header value for a fresh caller.
pub fn bearer(state: &AppState) -> String {
    let token = state
        .jwt_service
        .generate_access_token(Uuid::new_v4(), "ravi")
        .expect("should generate token");
    format!("Bearer {token}")
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
