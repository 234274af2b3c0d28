use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::location::ItemRef;
use domain::models::StockError;
use domain::services::{LoanError, StockChangeError, StoreError};
use serde::Serialize;
use shared::jwt::JwtError;
use shared::password::PasswordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A location still holds items.
    #[error("In use: {message}")]
    InUse {
        message: String,
        items: Vec<ItemRef>,
        item_count: i64,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<ItemRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_count: Option<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, items, item_count) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None, None),
            ApiError::InUse {
                message,
                items,
                item_count,
            } => (
                StatusCode::CONFLICT,
                "in_use",
                message,
                Some(items),
                Some(item_count),
            ),
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg, None, None)
            }
            ApiError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable",
                msg,
                None,
                None,
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            items,
            item_count,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        "23514" => ApiError::Validation("Value violates a constraint".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// True for PostgreSQL unique violations (SQLSTATE 23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// True for PostgreSQL foreign key violations (SQLSTATE 23503).
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = Vec::new();
        collect_messages(&errors, "", &mut messages);

        let message = match messages.len() {
            0 => "Invalid request".to_string(),
            1 => messages.remove(0),
            n => format!("{} validation errors: {}", n, messages.join("; ")),
        };

        ApiError::Validation(message)
    }
}

/// Flattens nested validation errors into `field: message` strings.
fn collect_messages(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let text = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(format!("{}: {}", path, text));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_messages(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => e.into(),
            StoreError::Inconsistent(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::LoanNotFound(_) => ApiError::NotFound(err.to_string()),
            LoanError::AlreadyReturned(_) => ApiError::Conflict(err.to_string()),
            LoanError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            LoanError::Validation(msg) => ApiError::Validation(msg),
            LoanError::Store(e) => ApiError::Internal(format!("Loan transaction failed: {}", e)),
        }
    }
}

impl From<StockChangeError> for ApiError {
    fn from(err: StockChangeError) -> Self {
        match err {
            StockChangeError::ItemNotFound(_) => ApiError::NotFound(err.to_string()),
            StockChangeError::Stock(StockError::NonPositiveQuantity(_)) => {
                ApiError::Validation(err.to_string())
            }
            StockChangeError::Stock(e) => ApiError::Unprocessable(e.to_string()),
            StockChangeError::Store(e) => e.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::PolicyViolation { .. } => ApiError::Validation(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Internal(format!("Token error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Unprocessable("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_in_use_body() {
        let error = ApiError::InUse {
            message: "Cannot delete drawer 'Top'".into(),
            items: vec![ItemRef {
                id: 4,
                name: "Pliers".into(),
            }],
            item_count: 1,
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "in_use");
        assert_eq!(body["item_count"], 1);
        assert_eq!(body["items"][0]["name"], "Pliers");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let body = body_json(ApiError::Internal("password=secret".into()).into_response()).await;
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("items").is_none());
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, ApiError::NotFound(msg) if msg == "Resource not found"));
    }

    #[test]
    fn test_from_loan_error() {
        assert!(matches!(
            ApiError::from(LoanError::LoanNotFound(3)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(LoanError::AlreadyReturned(3)),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(LoanError::Forbidden(3)),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(LoanError::Store(StoreError::Inconsistent("gone".into()))),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_from_stock_change_error() {
        assert!(matches!(
            ApiError::from(StockChangeError::Stock(StockError::NonPositiveQuantity(0))),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(StockChangeError::ItemNotFound(9)),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::Validate;

        let request = domain::models::location::CreateZoneRequest {
            name: "   ".into(),
            description: None,
        };
        let error: ApiError = request.validate().unwrap_err().into();
        match error {
            ApiError::Validation(msg) => assert!(msg.starts_with("name:")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
