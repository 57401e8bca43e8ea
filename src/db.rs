use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Category, DbSubject, Student, Subject, Tutor};

/// Shortest name fragment that triggers a prefix search.
pub const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFilter {
    All,
    TooShort,
    Prefix(String),
}

impl NameFilter {
    pub fn from_query(q: Option<&str>) -> Self {
        match q {
            None => NameFilter::All,
            Some(q) if q.chars().count() < MIN_SEARCH_LEN => NameFilter::TooShort,
            Some(q) => NameFilter::Prefix(format!("{}%", q)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TutorFields {
    pub name: String,
    pub role_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone)]
pub struct SubjectFields {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub class: String,
}

const SUBJECT_CODE_CONSTRAINT: &str = "subjects.code";

// Students

#[instrument(skip(pool))]
pub async fn list_students(pool: &Pool<Sqlite>, filter: &NameFilter) -> Result<Vec<Student>, AppError> {
    info!("Listing students");
    let rows = match filter {
        NameFilter::TooShort => return Ok(Vec::new()),
        NameFilter::All => {
            sqlx::query_as::<_, Student>("SELECT id, name FROM students ORDER BY id")
                .fetch_all(pool)
                .await?
        }
        NameFilter::Prefix(pattern) => {
            sqlx::query_as::<_, Student>(
                "SELECT id, name FROM students WHERE name LIKE ? ORDER BY id",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

#[instrument(skip(pool))]
pub async fn get_student(pool: &Pool<Sqlite>, id: i64) -> Result<Student, AppError> {
    info!("Fetching student by ID");
    let row = sqlx::query_as::<_, Student>("SELECT id, name FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
}

#[instrument(skip(pool))]
pub async fn create_student(pool: &Pool<Sqlite>, name: &str) -> Result<Student, AppError> {
    info!("Creating student");
    let res = sqlx::query("INSERT INTO students (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;

    get_student(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool))]
pub async fn update_student(pool: &Pool<Sqlite>, id: i64, name: &str) -> Result<Student, AppError> {
    info!("Updating student");
    let res = sqlx::query("UPDATE students SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Student with id {} not found", id)));
    }

    get_student(pool, id).await
}

// Tutors

#[instrument(skip(pool))]
pub async fn list_tutors(pool: &Pool<Sqlite>, filter: &NameFilter) -> Result<Vec<Tutor>, AppError> {
    info!("Listing tutors");
    let rows = match filter {
        NameFilter::TooShort => return Ok(Vec::new()),
        NameFilter::All => {
            sqlx::query_as::<_, Tutor>(
                "SELECT id, name, role_id, channel_id FROM tutors ORDER BY id",
            )
            .fetch_all(pool)
            .await?
        }
        NameFilter::Prefix(pattern) => {
            sqlx::query_as::<_, Tutor>(
                "SELECT id, name, role_id, channel_id FROM tutors WHERE name LIKE ? ORDER BY id",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

#[instrument(skip(pool))]
pub async fn get_tutor(pool: &Pool<Sqlite>, id: i64) -> Result<Tutor, AppError> {
    info!("Fetching tutor by ID");
    let row = sqlx::query_as::<_, Tutor>(
        "SELECT id, name, role_id, channel_id FROM tutors WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Tutor with id {} not found", id)))
}

#[instrument(skip(pool))]
pub async fn create_tutor(pool: &Pool<Sqlite>, fields: &TutorFields) -> Result<Tutor, AppError> {
    info!("Creating tutor");
    let res = sqlx::query("INSERT INTO tutors (name, role_id, channel_id) VALUES (?, ?, ?)")
        .bind(&fields.name)
        .bind(&fields.role_id)
        .bind(&fields.channel_id)
        .execute(pool)
        .await?;

    get_tutor(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool))]
pub async fn update_tutor(
    pool: &Pool<Sqlite>,
    id: i64,
    fields: &TutorFields,
) -> Result<Tutor, AppError> {
    info!("Updating tutor");
    let res = sqlx::query("UPDATE tutors SET name = ?, role_id = ?, channel_id = ? WHERE id = ?")
        .bind(&fields.name)
        .bind(&fields.role_id)
        .bind(&fields.channel_id)
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Tutor with id {} not found", id)));
    }

    get_tutor(pool, id).await
}

// Subjects

#[instrument(skip(pool))]
pub async fn list_subjects(
    pool: &Pool<Sqlite>,
    filter: &NameFilter,
    class: Option<&str>,
) -> Result<Vec<Subject>, AppError> {
    info!("Listing subjects");
    let rows = match (filter, class) {
        (NameFilter::TooShort, _) => return Ok(Vec::new()),
        (NameFilter::Prefix(pattern), _) => {
            sqlx::query_as::<_, DbSubject>(
                "SELECT id, code, name, description, class FROM subjects
                 WHERE name LIKE ? ORDER BY id",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        (NameFilter::All, Some(class)) => {
            sqlx::query_as::<_, DbSubject>(
                "SELECT id, code, name, description, class FROM subjects
                 WHERE class = ? ORDER BY id",
            )
            .bind(class)
            .fetch_all(pool)
            .await?
        }
        (NameFilter::All, None) => {
            sqlx::query_as::<_, DbSubject>(
                "SELECT id, code, name, description, class FROM subjects ORDER BY id",
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(Subject::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_subject(pool: &Pool<Sqlite>, id: i64) -> Result<Subject, AppError> {
    info!("Fetching subject by ID");
    let row = sqlx::query_as::<_, DbSubject>(
        "SELECT id, code, name, description, class FROM subjects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(subject) => Ok(Subject::from(subject)),
        None => Err(AppError::NotFound(format!("Subject with id {} not found", id))),
    }
}

#[instrument(skip(pool))]
pub async fn create_subject(
    pool: &Pool<Sqlite>,
    fields: &SubjectFields,
) -> Result<Subject, AppError> {
    info!("Creating subject");
    let res = sqlx::query(
        "INSERT INTO subjects (code, name, description, class) VALUES (?, ?, ?, ?)",
    )
    .bind(&fields.code)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.class)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, &[SUBJECT_CODE_CONSTRAINT], "Subject code already exists"))?;

    get_subject(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool))]
pub async fn update_subject(
    pool: &Pool<Sqlite>,
    id: i64,
    fields: &SubjectFields,
) -> Result<(), AppError> {
    info!("Updating subject");
    let res = sqlx::query(
        "UPDATE subjects SET code = ?, name = ?, description = ?, class = ? WHERE id = ?",
    )
    .bind(&fields.code)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.class)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, &[SUBJECT_CODE_CONSTRAINT], "Subject code already exists"))?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Subject with id {} not found", id)));
    }

    Ok(())
}

// Categories

#[instrument(skip(pool))]
pub async fn get_category_by_name(
    pool: &Pool<Sqlite>,
    name: &str,
) -> Result<Option<Category>, AppError> {
    let row = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

#[instrument(skip(pool))]
pub async fn insert_category(pool: &Pool<Sqlite>, name: &str) -> Result<i64, sqlx::Error> {
    let res = sqlx::query("INSERT INTO categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn insert_subject_category(
    pool: &Pool<Sqlite>,
    subject_id: i64,
    category_id: i64,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO subject_categories (subject_id, category_id) VALUES (?, ?)")
        .bind(subject_id)
        .bind(category_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_subject_categories(pool: &Pool<Sqlite>, subject_id: i64) -> Result<u64, AppError> {
    info!("Removing category links for subject");
    let res = sqlx::query("DELETE FROM subject_categories WHERE subject_id = ?")
        .bind(subject_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected())
}

#[instrument(skip(pool))]
pub async fn list_category_names_for_subject(
    pool: &Pool<Sqlite>,
    subject_id: i64,
) -> Result<Vec<String>, AppError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT c.name FROM categories c
         JOIN subject_categories sc ON sc.category_id = c.id
         WHERE sc.subject_id = ?
         ORDER BY c.name",
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await?;

    Ok(names)
}
