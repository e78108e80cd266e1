use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Database(DbErr),
}

/// Constraint violations are conflicts with existing rows, not server faults.
impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(violation) => AppError::from_sql_err(violation),
            None => AppError::Database(err),
        }
    }
}

impl AppError {
    fn from_sql_err(err: SqlErr) -> Self {
        match err {
            SqlErr::UniqueConstraintViolation(detail) => {
                tracing::warn!(detail = %detail, "Unique constraint violated");
                AppError::Conflict("A record with the same value already exists".to_string())
            }
            SqlErr::ForeignKeyConstraintViolation(detail) => {
                tracing::warn!(detail = %detail, "Foreign key constraint violated");
                AppError::Conflict("The record is referenced by, or refers to, missing data".to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full and answered generically
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database(sea_orm::DbErr::Custom("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_keeps_status() {
        let response = AppError::Unauthorized("Invalid token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_constraint_violations_are_conflicts() {
        let unique = AppError::from_sql_err(SqlErr::UniqueConstraintViolation(
            "duplicate key value violates unique constraint \"source_name_key\"".into(),
        ));
        assert_eq!(unique.status(), StatusCode::CONFLICT);

        let foreign = AppError::from_sql_err(SqlErr::ForeignKeyConstraintViolation(
            "update or delete on table \"source\" violates foreign key constraint".into(),
        ));
        assert_eq!(foreign.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_other_db_errors_stay_internal() {
        let err: AppError = DbErr::Custom("connection reset".into()).into();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
