//! Expense and participant routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use splitledger_core::split::{ExpenseHeader, ExpenseType, HeaderPatch, ParticipantInput, SplitRule};
use splitledger_db::{
    ExpenseRepository,
    entities::participant_shares,
    repositories::{
        CreateExpenseInput, ExpenseWithShares, LedgerError, UpdateExpenseInput,
        UpdateParticipantInput,
    },
};
use splitledger_shared::{AppError, types::PageRequest};
use tracing::error;
use uuid::Uuid;

use super::error_response;
use crate::{AppState, middleware::AuthUser};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{expense_id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
        .route(
            "/expenses/{expense_id}/participants/{participant_id}",
            patch(update_participant).delete(delete_participant),
        )
        .route(
            "/expenses/{expense_id}/participants/{participant_id}/paid",
            put(set_participant_paid),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

fn default_include_self() -> bool {
    true
}

/// Request body for creating an expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Expense name.
    pub name: String,
    /// Date incurred (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Total amount.
    pub amount: Decimal,
    /// Optional note.
    pub note: Option<String>,
    /// `personal` or `group`.
    pub expense_type: ExpenseType,
    /// Split rule, required for group expenses.
    pub split_rule: Option<SplitRule>,
    /// Number of external participants, required for group expenses.
    pub friend_count: Option<u32>,
    /// Whether the owner takes a share.
    #[serde(default = "default_include_self")]
    pub include_self: bool,
    /// External participants.
    #[serde(default)]
    pub participants: Vec<ParticipantInput>,
}

/// Request body for updating an expense. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    /// Expense name.
    pub name: Option<String>,
    /// Date incurred.
    pub date: Option<NaiveDate>,
    /// Total amount.
    pub amount: Option<Decimal>,
    /// Note.
    pub note: Option<String>,
    /// `personal` or `group`.
    pub expense_type: Option<ExpenseType>,
    /// Split rule.
    pub split_rule: Option<SplitRule>,
    /// Number of external participants.
    pub friend_count: Option<u32>,
    /// Whether the owner takes a share.
    pub include_self: Option<bool>,
    /// Replacement participant list.
    pub participants: Option<Vec<ParticipantInput>>,
}

/// Request body for correcting one participant.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateParticipantRequest {
    /// Display name.
    pub name: Option<String>,
    /// Username; empty clears it.
    pub username: Option<String>,
    /// Email; empty clears it.
    pub email: Option<String>,
    /// Share amount.
    pub amount: Option<Decimal>,
    /// Note; empty clears it.
    pub note: Option<String>,
    /// Paid flag.
    pub is_paid: Option<bool>,
}

/// Request body for the paid toggle.
#[derive(Debug, Deserialize)]
pub struct SetPaidRequest {
    /// New paid flag.
    pub paid: bool,
}

/// Response for an expense with its participants.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Expense name.
    pub name: String,
    /// Date incurred.
    pub date: NaiveDate,
    /// Total amount.
    pub amount: Decimal,
    /// Note.
    pub note: Option<String>,
    /// `personal` or `group`.
    pub expense_type: ExpenseType,
    /// Split rule.
    pub split_rule: Option<SplitRule>,
    /// Number of external participants.
    pub friend_count: Option<i32>,
    /// Whether the owner takes a share.
    pub include_self: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
    /// Share rows in display order.
    pub participants: Vec<ParticipantResponse>,
}

/// Response for one share row.
#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    /// Share ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Username.
    pub username: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Declared exact amount or percentage.
    pub declared_value: Option<Decimal>,
    /// Share amount.
    pub amount: Decimal,
    /// Note.
    pub note: Option<String>,
    /// Paid flag.
    pub is_paid: bool,
    /// Whether this is the owner's own share.
    pub is_owner_share: bool,
}

impl From<participant_shares::Model> for ParticipantResponse {
    fn from(s: participant_shares::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            username: s.username,
            email: s.email,
            declared_value: s.declared_value,
            amount: s.amount,
            note: s.note,
            is_paid: s.is_paid,
            is_owner_share: s.is_owner_share,
        }
    }
}

impl From<ExpenseWithShares> for ExpenseResponse {
    fn from(value: ExpenseWithShares) -> Self {
        let header = value.header();
        let e = value.expense;
        Self {
            id: e.id,
            name: e.name,
            date: e.expense_date,
            amount: e.amount,
            note: e.note,
            expense_type: header.expense_type,
            split_rule: header.split_rule,
            friend_count: e.friend_count,
            include_self: e.include_self,
            created_at: e.created_at.to_rfc3339(),
            updated_at: e.updated_at.to_rfc3339(),
            participants: value.shares.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/expenses` - List the caller's expenses.
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.list_expenses(auth.user_id(), page).await {
        Ok(page) => {
            let data: Vec<ExpenseResponse> = page.data.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data, "meta": page.meta }))).into_response()
        }
        Err(e) => map_ledger_error(e),
    }
}

/// POST `/expenses` - Create an expense and its shares.
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    let input = CreateExpenseInput {
        header: ExpenseHeader {
            name: payload.name,
            date: payload.date,
            amount: payload.amount,
            note: payload.note,
            expense_type: payload.expense_type,
            split_rule: payload.split_rule,
            friend_count: payload.friend_count,
            include_self: payload.include_self,
        },
        participants: payload.participants,
    };

    match repo.create_expense(auth.user_id(), input).await {
        Ok(created) => (StatusCode::CREATED, Json(ExpenseResponse::from(created))).into_response(),
        Err(e) => map_ledger_error(e),
    }
}

/// GET `/expenses/{expense_id}` - Get one expense with its shares.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.get_expense(auth.user_id(), expense_id).await {
        Ok(expense) => (StatusCode::OK, Json(ExpenseResponse::from(expense))).into_response(),
        Err(e) => map_ledger_error(e),
    }
}

/// PATCH `/expenses/{expense_id}` - Update an expense header and/or participants.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    let input = UpdateExpenseInput {
        patch: HeaderPatch {
            name: payload.name,
            date: payload.date,
            amount: payload.amount,
            note: payload.note,
            expense_type: payload.expense_type,
            split_rule: payload.split_rule,
            friend_count: payload.friend_count,
            include_self: payload.include_self,
        },
        participants: payload.participants,
    };

    match repo.update_expense(auth.user_id(), expense_id, input).await {
        Ok(updated) => (StatusCode::OK, Json(ExpenseResponse::from(updated))).into_response(),
        Err(e) => map_ledger_error(e),
    }
}

/// DELETE `/expenses/{expense_id}` - Delete an expense and everything under it.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.delete_expense(auth.user_id(), expense_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_ledger_error(e),
    }
}

/// PATCH `/expenses/{expense_id}/participants/{participant_id}` - Correct one share.
async fn update_participant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((expense_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateParticipantRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    let input = UpdateParticipantInput {
        name: payload.name,
        username: payload.username,
        email: payload.email,
        amount: payload.amount,
        note: payload.note,
        is_paid: payload.is_paid,
    };

    match repo
        .update_participant(auth.user_id(), expense_id, participant_id, input)
        .await
    {
        Ok(share) => (StatusCode::OK, Json(ParticipantResponse::from(share))).into_response(),
        Err(e) => map_ledger_error(e),
    }
}

/// DELETE `/expenses/{expense_id}/participants/{participant_id}` - Remove one share.
async fn delete_participant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((expense_id, participant_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo
        .delete_participant(auth.user_id(), expense_id, participant_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_ledger_error(e),
    }
}

/// PUT `/expenses/{expense_id}/participants/{participant_id}/paid` - Set the paid flag.
async fn set_participant_paid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((expense_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetPaidRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo
        .set_participant_paid(auth.user_id(), expense_id, participant_id, payload.paid)
        .await
    {
        Ok(share) => (StatusCode::OK, Json(ParticipantResponse::from(share))).into_response(),
        Err(e) => map_ledger_error(e),
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Maps ledger errors to HTTP responses.
fn map_ledger_error(e: LedgerError) -> Response {
    let code = e.error_code();

    let details = match &e {
        LedgerError::Split(split) => {
            let field = split.field();
            let issues = split.issues();
            (field.is_some() || !issues.is_empty())
                .then(|| json!({ "field": field, "issues": issues }))
        }
        LedgerError::Database(db) => {
            error!(error = %db, "Ledger storage failure");
            None
        }
        _ => None,
    };

    error_response(&AppError::from(e), code, details)
}
