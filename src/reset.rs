use sqlx::{Pool, Sqlite};
use thiserror::Error;
use tracing::{info, instrument};

use crate::error::AppError;

/// Tables cleared by a reset, in the order they are cleared.
pub const RESET_ORDER: [(&str, &str); 4] = [
    ("categories", "DELETE FROM categories"),
    ("students", "DELETE FROM students"),
    ("tutors", "DELETE FROM tutors"),
    ("subjects", "DELETE FROM subjects"),
];

#[derive(Error, Debug)]
#[error("Failed to reset {resource}: {source}")]
pub struct ResetError {
    pub resource: &'static str,
    #[source]
    pub source: sqlx::Error,
}

impl From<ResetError> for AppError {
    fn from(err: ResetError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Deletes every row of the top-level tables. Link rows go with their owners
/// through `ON DELETE CASCADE`. Steps already done stay done when a later one fails.
#[instrument(skip(pool))]
pub async fn reset_all(pool: &Pool<Sqlite>) -> Result<(), ResetError> {
    for (resource, statement) in RESET_ORDER {
        let res = sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|source| ResetError { resource, source })?;
        info!(resource, deleted = res.rows_affected(), "Reset table");
    }

    Ok(())
}
