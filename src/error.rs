use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::utils::cpf::CpfError;

/// Errors surfaced by the service layer and the handlers.
///
/// Every variant maps to an HTTP status and a `{"message": ...}` body, so a
/// handler can bubble any of them with `?`.
#[derive(Debug, Display)]
pub enum AppError {
    /// Malformed input: bad CPF, inverted date range, unknown enum code...
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// A referenced employee, client or entry does not exist.
    #[display(fmt = "{} not found", _0)]
    NotFound(String),

    /// Protected deletion or duplicated unique value.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// An atomic batch could not be committed; nothing was persisted.
    #[display(fmt = "transaction failed: {}", _0)]
    TransactionFailure(String),

    /// Report rendering (CSV) failed.
    #[display(fmt = "export failed: {}", _0)]
    Export(String),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl AppError {
    pub fn not_found(entity: &str, id: u64) -> Self {
        AppError::NotFound(format!("{entity} {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("record".to_string()),
            // MySQL reports both duplicate keys and foreign key violations as 23000
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                AppError::Conflict(
                    "Record is referenced by other data or duplicates an existing one".to_string(),
                )
            }
            _ => AppError::Database(e),
        }
    }
}

impl From<CpfError> for AppError {
    fn from(e: CpfError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TransactionFailure(_) | AppError::Export(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::TransactionFailure(_) => {
                tracing::error!(error = %self, "Atomic batch rolled back");
                "Operation failed, no changes were saved".to_string()
            }
            AppError::Export(_) | AppError::Database(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("Employee", 7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("in use".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::TransactionFailure("deadlock".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(AppError::not_found("Employee", 7).to_string(), "Employee 7 not found");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn cpf_errors_are_validation_errors() {
        let err = AppError::from(CpfError::ChecksumMismatch);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
