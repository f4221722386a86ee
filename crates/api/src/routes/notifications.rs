//! Reminder schedule routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use splitledger_db::{
    NotificationRepository,
    entities::expense_notifications,
    repositories::{NotificationError, ScheduleReminderInput},
};
use splitledger_shared::AppError;
use tracing::{error, warn};
use uuid::Uuid;

use super::error_response;
use crate::{AppState, middleware::AuthUser};

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/expenses/{expense_id}/notification",
        get(get_notification).put(schedule_notification),
    )
}

/// Request body for scheduling reminders.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    /// Due date in the configured timezone.
    pub due_date: NaiveDate,
    /// Due time in the configured timezone.
    pub due_time: NaiveTime,
    /// Whether reminders are enabled.
    pub enabled: bool,
}

/// Response for a reminder schedule.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Expense ID.
    pub expense_id: Uuid,
    /// Due date.
    pub due_date: NaiveDate,
    /// Due time.
    pub due_time: NaiveTime,
    /// Due instant (RFC 3339).
    pub due_at: String,
    /// Whether reminders are enabled.
    pub enabled: bool,
    /// 24-hour reminder sent or skipped.
    pub reminder_24h_sent: bool,
    /// 1-hour reminder sent or skipped.
    pub reminder_1h_sent: bool,
    /// Immediate reminders delivered by this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate_delivered: Option<usize>,
}

impl From<expense_notifications::Model> for NotificationResponse {
    fn from(n: expense_notifications::Model) -> Self {
        Self {
            expense_id: n.expense_id,
            due_date: n.due_date,
            due_time: n.due_time,
            due_at: n.due_at.to_rfc3339(),
            enabled: n.enabled,
            reminder_24h_sent: n.reminder_24h_sent,
            reminder_1h_sent: n.reminder_1h_sent,
            immediate_delivered: None,
        }
    }
}

/// GET `/expenses/{expense_id}/notification` - Current reminder schedule.
async fn get_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.find_for_expense(auth.user_id(), expense_id).await {
        Ok(Some(n)) => (StatusCode::OK, Json(NotificationResponse::from(n))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "notification_not_found",
                "message": "No reminders scheduled for this expense"
            })),
        )
            .into_response(),
        Err(e) => map_notification_error(e),
    }
}

/// PUT `/expenses/{expense_id}/notification` - Schedule or reschedule reminders.
///
/// Enabling reminders also sends one right away to every unpaid participant.
async fn schedule_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ScheduleRequest>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    let input = ScheduleReminderInput {
        due_date: payload.due_date,
        due_time: payload.due_time,
        enabled: payload.enabled,
    };

    let notification = match repo
        .schedule(auth.user_id(), expense_id, input, state.reminder_timezone, Utc::now())
        .await
    {
        Ok(n) => n,
        Err(e) => return map_notification_error(e),
    };

    let immediate = if notification.enabled {
        match state.reminders.send_immediate(&notification).await {
            Ok(report) => Some(report.delivered),
            Err(e) => {
                warn!(expense_id = %expense_id, error = %e, "Immediate reminder failed");
                None
            }
        }
    } else {
        None
    };

    let response = NotificationResponse {
        immediate_delivered: immediate,
        ..NotificationResponse::from(notification)
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn map_notification_error(e: NotificationError) -> Response {
    if let NotificationError::Database(db) = &e {
        error!(error = %db, "Notification storage failure");
    }
    let code = e.error_code();
    error_response(&AppError::from(e), code, None)
}
