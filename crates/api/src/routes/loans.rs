//! Borrow, return and loan listing routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::loan::{CreateLoanRequest, ListLoansQuery};
use domain::models::{Actor, Loan, LoanView};
use domain::services::{CreateLoanOutcome, LoanItemFailure, LoanLine};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{
    record_loan_batch_rejected, record_loan_returned, record_loans_created, record_stock_alerts,
};

/// One line of a borrow response, tagged by `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status")]
pub enum LoanLineResponse {
    #[serde(rename = "success")]
    Success {
        id: i64,
        item_id: i64,
        item_name: String,
        quantity: i32,
        user_name: String,
        is_temporary: bool,
        remaining_stock: i32,
        expected_return_date: DateTime<Utc>,
    },
    #[serde(rename = "error")]
    Error {
        item_name: String,
        quantity: i32,
        error: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        available: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        requested: Option<i32>,
    },
}

impl LoanLineResponse {
    fn from_line(line: LoanLine, actor: &Actor) -> Self {
        match line {
            LoanLine::Borrowed {
                loan,
                item_name,
                is_temporary,
                remaining_stock,
            } => LoanLineResponse::Success {
                id: loan.id,
                item_id: loan.item_id,
                item_name,
                quantity: loan.quantity,
                user_name: actor.name.clone(),
                is_temporary,
                remaining_stock,
                expected_return_date: loan.expected_return_date,
            },
            LoanLine::Failed {
                item_name,
                quantity,
                failure,
            } => {
                let (available, requested) = match &failure {
                    LoanItemFailure::InsufficientStock {
                        available,
                        requested,
                    } => (Some(*available), Some(*requested)),
                    LoanItemFailure::ItemNotFound { .. } => (None, None),
                };
                LoanLineResponse::Error {
                    item_name,
                    quantity,
                    error: failure.code(),
                    message: failure.message(),
                    available,
                    requested,
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateLoanResponse {
    pub success: bool,
    pub message: String,
    pub loans: Vec<LoanLineResponse>,
    pub notifications: Vec<String>,
}

impl CreateLoanResponse {
    fn from_outcome(outcome: CreateLoanOutcome, actor: &Actor) -> Self {
        let borrowed = outcome.borrowed_count();
        let failed = outcome.failed_count();
        let message = match (borrowed, failed) {
            (0, _) => "No items could be borrowed".to_string(),
            (_, 0) => format!("Borrowed {} item(s)", borrowed),
            _ => format!("Borrowed {} item(s), {} failed", borrowed, failed),
        };
        Self {
            success: outcome.committed,
            message,
            loans: outcome
                .lines
                .into_iter()
                .map(|line| LoanLineResponse::from_line(line, actor))
                .collect(),
            notifications: outcome.notifications,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnLoanResponse {
    pub success: bool,
    pub message: String,
    pub loan: Loan,
    pub item_stock: i32,
    pub retired_notifications: u64,
}

/// POST /api/v1/loans
///
/// Returns 200 when at least one line was borrowed and 422 when every line
/// failed. Malformed payloads are rejected as a whole with 400.
pub async fn create_loan(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<CreateLoanResponse>), ApiError> {
    request.validate()?;
    let limits = &state.config.limits;
    let loan_request = request
        .into_loan_request(limits.max_loan_items, limits.max_name_length)
        .map_err(ApiError::Validation)?;

    let outcome = state
        .loan_service
        .create_loan(&auth.actor, loan_request)
        .await?;

    let status = if outcome.committed {
        record_loans_created(outcome.borrowed_count());
        record_stock_alerts(outcome.notifications.len());
        StatusCode::OK
    } else {
        record_loan_batch_rejected();
        StatusCode::UNPROCESSABLE_ENTITY
    };

    info!(
        user_id = auth.actor.user_id,
        borrowed = outcome.borrowed_count(),
        failed = outcome.failed_count(),
        committed = outcome.committed,
        "Borrow request processed"
    );

    Ok((
        status,
        Json(CreateLoanResponse::from_outcome(outcome, &auth.actor)),
    ))
}

/// GET /api/v1/loans
///
/// Without `user_id`, admins see every loan and other users their own.
pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<ListLoansQuery>,
    auth: UserAuth,
) -> Result<Json<Vec<LoanView>>, ApiError> {
    let user_id = match query.user_id {
        Some(id) if !auth.actor.can_act_for(id) => {
            return Err(ApiError::Forbidden(
                "Only admins can list other users' loans".to_string(),
            ));
        }
        Some(id) => Some(id),
        None if auth.actor.is_admin() => None,
        None => Some(auth.actor.user_id),
    };

    let now = Utc::now();
    let loans = state.loans.list(user_id, query.active_only).await?;
    Ok(Json(
        loans.into_iter().map(|row| row.into_view(now)).collect(),
    ))
}

/// POST /api/v1/loans/:id/return
pub async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    auth: UserAuth,
) -> Result<Json<ReturnLoanResponse>, ApiError> {
    let outcome = state.loan_service.return_loan(&auth.actor, id).await?;
    record_loan_returned();

    Ok(Json(ReturnLoanResponse {
        success: true,
        message: format!("Returned '{}'", outcome.item_name),
        loan: outcome.loan,
        item_stock: outcome.item_stock,
        retired_notifications: outcome.retired_alerts,
    }))
}
