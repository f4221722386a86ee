//! Settlement routes: balance sheet, portfolio summary and unpaid list.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use splitledger_db::{SettlementRepository, repositories::SettlementError};
use splitledger_shared::AppError;
use tracing::error;

use super::error_response;
use crate::{AppState, middleware::AuthUser};

/// Creates the settlement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/balance-sheet", get(balance_sheet))
        .route("/portfolio-summary", get(portfolio_summary))
        .route("/unpaid", get(list_unpaid))
}

/// GET `/balance-sheet` - What the caller paid and is owed, per expense.
async fn balance_sheet(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = SettlementRepository::new((*state.db).clone());

    match repo.balance_sheet(auth.user_id()).await {
        Ok(sheet) => (StatusCode::OK, Json(sheet)).into_response(),
        Err(e) => map_settlement_error(e),
    }
}

/// GET `/portfolio-summary` - Counts and sums across the caller's expenses.
async fn portfolio_summary(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = SettlementRepository::new((*state.db).clone());

    match repo.portfolio_summary(auth.user_id()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => map_settlement_error(e),
    }
}

/// GET `/unpaid` - Every unpaid share owed to the caller.
async fn list_unpaid(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = SettlementRepository::new((*state.db).clone());

    match repo.list_unpaid(auth.user_id()).await {
        Ok(unpaid) => (StatusCode::OK, Json(json!({ "unpaid": unpaid }))).into_response(),
        Err(e) => map_settlement_error(e),
    }
}

fn map_settlement_error(e: SettlementError) -> Response {
    let code = match &e {
        SettlementError::OwnerNotFound(_) => "OWNER_NOT_FOUND",
        SettlementError::Database(db) => {
            error!(error = %db, "Settlement query failed");
            "DATABASE_ERROR"
        }
    };
    error_response(&AppError::from(e), code, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth_middleware;
    use crate::test_support::{bearer, body_json, test_state};
    use axum::{body::Body, http::Request, http::header::AUTHORIZATION, middleware::from_fn_with_state};
    use rstest::rstest;
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    #[rstest]
    #[case("/balance-sheet")]
    #[case("/portfolio-summary")]
    #[case("/unpaid")]
    #[tokio::test]
    async fn test_rollups_require_auth(#[case] uri: &str) {
        let response = app(test_state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/balance-sheet")
                    .header(AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rollup_storage_failure_is_retryable() {
        let state = test_state();
        let auth = bearer(&state);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/portfolio-summary")
                    .header(AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "database_error");
    }
}
