use once_cell::sync::Lazy;
use opentelemetry_semantic_conventions::{attribute::OTEL_STATUS_CODE, trace::ERROR_TYPE};
use regex::Regex;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::{Span, error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn log_and_record(&self, ctx: &str) {
        let current_span = Span::current();
        let is_valid_span = !current_span.is_none();

        let message = self.to_string();
        let error_kind = match self {
            AppError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error");
                "database_error"
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found error");
                "not_found_error"
            }
            AppError::Validation(msg) => {
                warn!(message = %msg, context = %ctx, "Validation error");
                "validation_error"
            }
            AppError::Conflict(msg) => {
                warn!(message = %msg, context = %ctx, "Conflict error");
                "conflict_error"
            }
            AppError::MethodNotAllowed(msg) => {
                warn!(message = %msg, context = %ctx, "Method not allowed");
                "method_error"
            }
            AppError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal server error");
                "internal_error"
            }
        };

        if is_valid_span {
            current_span.record("error", tracing::field::display(true));
            current_span.record(ERROR_TYPE, tracing::field::display(error_kind));
            current_span.record("error.message", tracing::field::display(&message));

            if let AppError::Database(_) | AppError::Internal(_) = self {
                current_span.record(OTEL_STATUS_CODE, tracing::field::display("ERROR"));
            }
        }
    }

    pub fn status_code(&self) -> Status {
        match self {
            AppError::Database(_) => Status::InternalServerError,
            AppError::NotFound(_) => Status::NotFound,
            AppError::Validation(_) => Status::BadRequest,
            AppError::Conflict(_) => Status::Conflict,
            AppError::MethodNotAllowed(_) => Status::MethodNotAllowed,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    /// Message sent to the client, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            AppError::Database(err) => err.to_string(),
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::MethodNotAllowed(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }

    pub fn to_status_with_log(&self, context: &str) -> Status {
        self.log_and_record(context);
        self.status_code()
    }

    /// Classifies a failed write against the constraint identifiers the caller
    /// treats as conflicts. Foreign key failures mean a referenced row is missing.
    pub fn from_write(err: sqlx::Error, conflicts: &[&str], conflict_message: &str) -> Self {
        match ConstraintViolation::classify(&err) {
            Some(violation) if violation.is_conflict(conflicts) => {
                AppError::Conflict(conflict_message.to_string())
            }
            Some(ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                ..
            }) => AppError::Validation("Referenced record does not exist".to_string()),
            _ => AppError::Database(err),
        }
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        let status = self.to_status_with_log(&format!("Request to {} {}", req.method(), req.uri()));
        Custom(status, Json(ErrorResponse::new(status, self.message()))).respond_to(req)
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.to_status_with_log("Error conversion into Status")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error_kind(status).to_string(),
            message: message.into(),
        }
    }
}

fn error_kind(status: Status) -> &'static str {
    match status.code {
        400 | 422 => "bad_request",
        404 => "not_found",
        405 => "method_not_allowed",
        409 => "conflict",
        _ => "internal_error",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Other,
}

/// Structured view of a constraint failure reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    /// `table.column` identifiers, comma separated for composite keys.
    pub constraint: String,
}

static SQLITE_CONSTRAINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:UNIQUE|FOREIGN KEY|NOT NULL|CHECK) constraint failed(?:: (.+))?$")
        .expect("constraint pattern is valid")
});

impl ConstraintViolation {
    pub fn classify(err: &sqlx::Error) -> Option<Self> {
        let db_err = err.as_database_error()?;

        let kind = match db_err.kind() {
            ErrorKind::UniqueViolation => ConstraintKind::Unique,
            ErrorKind::ForeignKeyViolation => ConstraintKind::ForeignKey,
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => ConstraintKind::Other,
            _ => return None,
        };

        let constraint = match db_err.constraint() {
            Some(name) => name.to_string(),
            None => SQLITE_CONSTRAINT
                .captures(db_err.message())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        };

        Some(Self { kind, constraint })
    }

    pub fn is_conflict(&self, conflicts: &[&str]) -> bool {
        self.kind == ConstraintKind::Unique
            && conflicts
                .iter()
                .any(|c| self.constraint.split(", ").any(|part| part == *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_constraint_matches_any_column() {
        let violation = ConstraintViolation {
            kind: ConstraintKind::Unique,
            constraint: "student_subject_completions.student_id, student_subject_completions.subject_id"
                .to_string(),
        };

        assert!(violation.is_conflict(&["student_subject_completions.subject_id"]));
        assert!(!violation.is_conflict(&["student_discords.discord_id"]));
    }

    #[test]
    fn foreign_key_failure_is_never_a_conflict() {
        let violation = ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            constraint: String::new(),
        };

        assert!(!violation.is_conflict(&[""]));
    }

    #[test]
    fn statuses_follow_error_taxonomy() {
        assert_eq!(AppError::Validation("x".into()).status_code(), Status::BadRequest);
        assert_eq!(AppError::NotFound("x".into()).status_code(), Status::NotFound);
        assert_eq!(AppError::Conflict("x".into()).status_code(), Status::Conflict);
        assert_eq!(
            AppError::MethodNotAllowed("x".into()).status_code(),
            Status::MethodNotAllowed
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            Status::InternalServerError
        );
    }

    #[test]
    fn client_message_drops_variant_prefix() {
        let err = AppError::Validation("Invalid student id format".into());

        assert_eq!(err.message(), "Invalid student id format");
        assert_eq!(err.to_string(), "Validation error: Invalid student id format");
    }
}
