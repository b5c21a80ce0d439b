//! Error type shared by the booking core and the HTTP layer.
//!
//! Every variant is recoverable at the request boundary. [`IntoResponse`]
//! turns it into a JSON body of the shape `{"error", "code", "field"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::DbId;

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// A row or seat number outside the dome grid.
    #[error("{field} number must be in available range: (1, {limit_name}): (1, {max})")]
    Range {
        field: &'static str,
        value: i32,
        limit_name: &'static str,
        max: i32,
    },

    /// Seat already taken, speaker double-booked or a duplicate unique name.
    #[error("{0}")]
    Conflict(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Returns the violated constraint name when `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

impl BookingError {
    /// Translates a unique violation on `constraint` into [`BookingError::Conflict`],
    /// passing every other database error through untouched.
    pub fn on_unique(err: sqlx::Error, constraint: &str, message: impl FnOnce() -> String) -> Self {
        if unique_violation(&err) == Some(constraint) {
            BookingError::Conflict(message())
        } else {
            BookingError::Database(err)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::Range { .. }
            | BookingError::Validation(_)
            | BookingError::Invalid(_) => StatusCode::BAD_REQUEST,
            BookingError::Conflict(_) => StatusCode::CONFLICT,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            BookingError::Database(_) | BookingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            BookingError::Range { .. } => "RANGE_ERROR",
            BookingError::Conflict(_) => "CONFLICT",
            BookingError::NotFound { .. } | BookingError::Database(sqlx::Error::RowNotFound) => {
                "NOT_FOUND"
            }
            BookingError::Validation(_) | BookingError::Invalid(_) => "VALIDATION_ERROR",
            BookingError::Database(_) | BookingError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            BookingError::Range { field, value, .. } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "field": field,
                "value": value,
            }),
            BookingError::Invalid(errors) => json!({
                "error": "Invalid input",
                "code": self.code(),
                "fields": errors.field_errors().keys().collect::<Vec<_>>(),
            }),
            BookingError::Database(sqlx::Error::RowNotFound) => json!({
                "error": "Resource not found",
                "code": self.code(),
            }),
            BookingError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                json!({
                    "error": "An internal error occurred",
                    "code": self.code(),
                })
            }
            BookingError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                json!({
                    "error": "An internal error occurred",
                    "code": self.code(),
                })
            }
            _ => json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_message_names_the_bound() {
        let err = BookingError::Range {
            field: "row",
            value: 11,
            limit_name: "rows",
            max: 10,
        };
        assert_eq!(
            err.to_string(),
            "row number must be in available range: (1, rows): (1, 10)"
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            BookingError::Conflict("taken".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BookingError::NotFound { entity: "Show session", id: 7 }
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BookingError::Database(sqlx::Error::PoolTimedOut)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert_eq!(unique_violation(&sqlx::Error::RowNotFound), None);
        let err = BookingError::on_unique(sqlx::Error::RowNotFound, "uq_x", || "dup".into());
        assert!(matches!(err, BookingError::Database(sqlx::Error::RowNotFound)));
    }
}
