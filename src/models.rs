use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Tutor {
    pub id: i64,
    pub name: String,
    pub role_id: String,
    pub channel_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub class: String,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbSubject {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub class: String,
}

impl From<DbSubject> for Subject {
    fn from(subject: DbSubject) -> Self {
        Self {
            id: subject.id,
            code: subject.code,
            name: subject.name,
            description: subject.description.unwrap_or_default(),
            class: subject.class,
        }
    }
}

/// A subject with the names of its linked categories, recomputed on every read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubjectView {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub class: String,
    pub categories: Vec<String>,
}

impl SubjectView {
    pub fn new(subject: Subject, categories: Vec<String>) -> Self {
        Self {
            id: subject.id,
            code: subject.code,
            name: subject.name,
            description: subject.description,
            class: subject.class,
            categories,
        }
    }
}

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct StudentTutor {
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StudentSubjectCompletion {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub completed_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbStudentSubjectCompletion {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub completed_at: NaiveDateTime,
}

impl From<DbStudentSubjectCompletion> for StudentSubjectCompletion {
    fn from(db: DbStudentSubjectCompletion) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            subject_id: db.subject_id,
            completed_at: DateTime::<Utc>::from_naive_utc_and_offset(db.completed_at, Utc),
        }
    }
}

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct StudentDiscord {
    pub student_id: i64,
    pub discord_id: String,
}

#[derive(Serialize, Deserialize, sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct TutorDiscord {
    pub tutor_id: i64,
    pub discord_id: String,
}
