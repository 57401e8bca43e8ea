//! Link tables that share one list / create / get / delete contract.
//!
//! Each link kind describes its table once through [`LinkTable`] and the
//! [`Link`] trait; [`AssociationManager`] holds the shared query logic.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    DbStudentSubjectCompletion, StudentDiscord, StudentSubjectCompletion, StudentTutor,
    TutorDiscord,
};

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Id(i64),
    Text(String),
}

impl KeyValue {
    fn bind(self, query: SqliteQuery<'_>) -> SqliteQuery<'_> {
        match self {
            KeyValue::Id(id) => query.bind(id),
            KeyValue::Text(text) => query.bind(text),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Id(id) => write!(f, "{}", id),
            KeyValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A filter value supplied for one column of a link table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFilter {
    pub column: &'static str,
    pub value: KeyValue,
}

impl LinkFilter {
    pub fn id(column: &'static str, id: i64) -> Self {
        Self {
            column,
            value: KeyValue::Id(id),
        }
    }

    pub fn text(column: &'static str, text: impl Into<String>) -> Self {
        Self {
            column,
            value: KeyValue::Text(text.into()),
        }
    }
}

#[derive(Debug)]
pub struct LinkTable {
    /// Human readable name used in messages.
    pub resource: &'static str,
    pub table: &'static str,
    pub select_columns: &'static str,
    pub insert_columns: &'static [&'static str],
    /// Column addressed by get and delete.
    pub key_column: &'static str,
    /// Column used to read a row back after it was inserted.
    pub lookup_column: &'static str,
    /// Filterable columns, highest precedence first.
    pub filters: &'static [&'static str],
    /// Constraint identifiers whose violation is reported as a conflict.
    pub unique_constraints: &'static [&'static str],
    pub conflict_message: &'static str,
}

pub trait Link: Serialize + Sized + Send + Sync + Unpin + 'static {
    type Row: for<'r> FromRow<'r, SqliteRow> + Into<Self> + Send + Unpin;
    type New: fmt::Debug + Send + Sync;

    const TABLE: LinkTable;

    /// Binds the values of `insert_columns`, in order.
    fn bind_new<'q>(new: &Self::New, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    /// Value of `lookup_column` for a row just inserted from `new`.
    fn lookup_key(new: &Self::New, rowid: i64) -> KeyValue;
}

pub struct AssociationManager<L: Link> {
    _link: PhantomData<L>,
}

impl<L: Link> AssociationManager<L> {
    /// Picks the highest-precedence filter that was supplied; other filters are ignored.
    pub fn select_filter(supplied: &[LinkFilter]) -> Option<&LinkFilter> {
        L::TABLE
            .filters
            .iter()
            .find_map(|column| supplied.iter().find(|f| f.column == *column))
    }

    #[instrument(skip(pool), fields(table = L::TABLE.table))]
    pub async fn list(pool: &Pool<Sqlite>, supplied: &[LinkFilter]) -> Result<Vec<L>, AppError> {
        info!("Listing links");
        let table = &L::TABLE;
        let rows = match Self::select_filter(supplied) {
            Some(filter) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
                    table.select_columns, table.table, filter.column, table.key_column
                );
                filter
                    .value
                    .clone()
                    .bind(sqlx::query(&sql))
                    .try_map(|row: SqliteRow| L::Row::from_row(&row))
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM {} ORDER BY {}",
                    table.select_columns, table.table, table.key_column
                );
                sqlx::query_as::<_, L::Row>(&sql).fetch_all(pool).await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(pool), fields(table = L::TABLE.table))]
    pub async fn get(pool: &Pool<Sqlite>, key: i64) -> Result<L, AppError> {
        info!("Fetching link by key");
        Self::find_by(pool, L::TABLE.key_column, KeyValue::Id(key))
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} {} not found", L::TABLE.resource, key))
            })
    }

    /// Inserts a link and returns it as read back from the table.
    #[instrument(skip(pool), fields(table = L::TABLE.table))]
    pub async fn create(pool: &Pool<Sqlite>, new: &L::New) -> Result<L, AppError> {
        info!("Creating link");
        let table = &L::TABLE;
        let placeholders = vec!["?"; table.insert_columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.table,
            table.insert_columns.join(", "),
            placeholders
        );

        let res = L::bind_new(new, sqlx::query(&sql))
            .execute(pool)
            .await
            .map_err(|e| AppError::from_write(e, table.unique_constraints, table.conflict_message))?;

        let key = L::lookup_key(new, res.last_insert_rowid());
        Self::find_by(pool, table.lookup_column, key.clone())
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Newly created {} {} not found",
                    table.resource, key
                ))
            })
    }

    #[instrument(skip(pool), fields(table = L::TABLE.table))]
    pub async fn delete(pool: &Pool<Sqlite>, key: i64) -> Result<(), AppError> {
        info!("Deleting link");
        let table = &L::TABLE;
        let sql = format!("DELETE FROM {} WHERE {} = ?", table.table, table.key_column);
        let res = sqlx::query(&sql).bind(key).execute(pool).await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                table.resource, key
            )));
        }

        Ok(())
    }

    async fn find_by(
        pool: &Pool<Sqlite>,
        column: &str,
        value: KeyValue,
    ) -> Result<Option<L>, AppError> {
        let table = &L::TABLE;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            table.select_columns, table.table, column
        );
        let row = value
            .bind(sqlx::query(&sql))
            .try_map(|row: SqliteRow| L::Row::from_row(&row))
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }
}

#[derive(Debug, Clone)]
pub struct NewStudentTutor {
    pub student_id: i64,
    pub tutor_id: i64,
}

// No uniqueness on (student_id, tutor_id): the same pair may be linked twice.
impl Link for StudentTutor {
    type Row = StudentTutor;
    type New = NewStudentTutor;

    const TABLE: LinkTable = LinkTable {
        resource: "Student tutor",
        table: "student_tutors",
        select_columns: "id, student_id, tutor_id",
        insert_columns: &["student_id", "tutor_id"],
        key_column: "id",
        lookup_column: "id",
        filters: &["tutor_id", "student_id"],
        unique_constraints: &[],
        conflict_message: "Student tutor already exists",
    };

    fn bind_new<'q>(new: &Self::New, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(new.student_id).bind(new.tutor_id)
    }

    fn lookup_key(_new: &Self::New, rowid: i64) -> KeyValue {
        KeyValue::Id(rowid)
    }
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub student_id: i64,
    pub subject_id: i64,
}

// completed_at is filled in by the column default.
impl Link for StudentSubjectCompletion {
    type Row = DbStudentSubjectCompletion;
    type New = NewCompletion;

    const TABLE: LinkTable = LinkTable {
        resource: "Student subject completion",
        table: "student_subject_completions",
        select_columns: "id, student_id, subject_id, completed_at",
        insert_columns: &["student_id", "subject_id"],
        key_column: "id",
        lookup_column: "id",
        filters: &["student_id", "subject_id"],
        unique_constraints: &[
            "student_subject_completions.student_id",
            "student_subject_completions.subject_id",
        ],
        conflict_message: "Student has already completed this subject",
    };

    fn bind_new<'q>(new: &Self::New, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(new.student_id).bind(new.subject_id)
    }

    fn lookup_key(_new: &Self::New, rowid: i64) -> KeyValue {
        KeyValue::Id(rowid)
    }
}

#[derive(Debug, Clone)]
pub struct NewStudentDiscord {
    pub student_id: i64,
    pub discord_id: String,
}

impl Link for StudentDiscord {
    type Row = StudentDiscord;
    type New = NewStudentDiscord;

    const TABLE: LinkTable = LinkTable {
        resource: "Student discord",
        table: "student_discords",
        select_columns: "student_id, discord_id",
        insert_columns: &["student_id", "discord_id"],
        key_column: "student_id",
        lookup_column: "discord_id",
        filters: &["discord_id", "student_id"],
        unique_constraints: &["student_discords.student_id", "student_discords.discord_id"],
        conflict_message: "Student ID or Discord ID already associated",
    };

    fn bind_new<'q>(new: &Self::New, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(new.student_id).bind(new.discord_id.clone())
    }

    fn lookup_key(new: &Self::New, _rowid: i64) -> KeyValue {
        KeyValue::Text(new.discord_id.clone())
    }
}

#[derive(Debug, Clone)]
pub struct NewTutorDiscord {
    pub tutor_id: i64,
    pub discord_id: String,
}

impl Link for TutorDiscord {
    type Row = TutorDiscord;
    type New = NewTutorDiscord;

    const TABLE: LinkTable = LinkTable {
        resource: "Tutor discord",
        table: "tutor_discords",
        select_columns: "tutor_id, discord_id",
        insert_columns: &["tutor_id", "discord_id"],
        key_column: "tutor_id",
        lookup_column: "discord_id",
        filters: &["discord_id", "tutor_id"],
        unique_constraints: &["tutor_discords.tutor_id", "tutor_discords.discord_id"],
        conflict_message: "Tutor ID or Discord ID already associated",
    };

    fn bind_new<'q>(new: &Self::New, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(new.tutor_id).bind(new.discord_id.clone())
    }

    fn lookup_key(new: &Self::New, _rowid: i64) -> KeyValue {
        KeyValue::Text(new.discord_id.clone())
    }
}

pub type StudentTutors = AssociationManager<StudentTutor>;
pub type Completions = AssociationManager<StudentSubjectCompletion>;
pub type StudentDiscords = AssociationManager<StudentDiscord>;
pub type TutorDiscords = AssociationManager<TutorDiscord>;
