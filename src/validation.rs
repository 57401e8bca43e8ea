use rocket::serde::json::{self, Json};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

pub trait JsonValidateExt<T> {
    /// Unwraps a JSON body and runs its `validator` rules.
    fn validate_body(self) -> Result<T, AppError>;
}

impl<T: Validate> JsonValidateExt<T> for Result<Json<T>, json::Error<'_>> {
    fn validate_body(self) -> Result<T, AppError> {
        let body = self
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?
            .into_inner();

        body.validate().map_err(validation_message)?;

        Ok(body)
    }
}

fn validation_message(errors: ValidationErrors) -> AppError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| "Invalid value".into());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    messages.sort();

    AppError::Validation(messages.join("; "))
}

/// Parses an id taken from a path segment or query parameter.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid {} format", what)))
}

/// Treats a missing or empty query parameter as absent.
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|value| !value.is_empty())
}
