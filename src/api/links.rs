use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{self, Json};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::association::{
    AssociationManager, Completions, Link, LinkFilter, NewCompletion, NewStudentDiscord,
    NewStudentTutor, NewTutorDiscord, StudentDiscords, StudentTutors, TutorDiscords,
};
use crate::error::AppError;
use crate::models::{StudentDiscord, StudentSubjectCompletion, StudentTutor, TutorDiscord};
use crate::validation::{JsonValidateExt, non_empty, parse_id};

/// A filter query parameter as received, before parsing.
#[derive(Clone, Copy)]
enum RawFilter<'a> {
    Id(&'static str, Option<&'a str>),
    Text(&'static str, Option<&'a str>),
}

/// Parses the first supplied filter, candidates given highest precedence
/// first. Lower-precedence parameters are ignored without being parsed.
fn first_filter(candidates: &[RawFilter<'_>]) -> Result<Vec<LinkFilter>, AppError> {
    for candidate in candidates {
        match *candidate {
            RawFilter::Id(column, raw) => {
                if let Some(raw) = non_empty(raw) {
                    return Ok(vec![LinkFilter::id(column, parse_id(raw, column)?)]);
                }
            }
            RawFilter::Text(column, raw) => {
                if let Some(raw) = non_empty(raw) {
                    return Ok(vec![LinkFilter::text(column, raw)]);
                }
            }
        }
    }

    Ok(Vec::new())
}

async fn create_link<L: Link>(
    db: &Pool<Sqlite>,
    new: &L::New,
) -> Result<Custom<Json<L>>, AppError> {
    let link = AssociationManager::<L>::create(db, new).await?;
    Ok(Custom(Status::Created, Json(link)))
}

async fn delete_link<L: Link>(db: &Pool<Sqlite>, raw_key: &str, what: &str) -> Result<Status, AppError> {
    let key = parse_id(raw_key, what)?;
    AssociationManager::<L>::delete(db, key).await?;
    Ok(Status::NoContent)
}

// Student tutors

#[derive(Deserialize, Validate, Debug)]
pub struct StudentTutorRequest {
    pub student_id: i64,
    pub tutor_id: i64,
}

#[get("/students-tutors?<student_id>&<tutor_id>")]
pub async fn api_list_student_tutors(
    student_id: Option<&str>,
    tutor_id: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<StudentTutor>>, AppError> {
    let filters = first_filter(&[
        RawFilter::Id("tutor_id", tutor_id),
        RawFilter::Id("student_id", student_id),
    ])?;

    Ok(Json(StudentTutors::list(db, &filters).await?))
}

#[post("/students-tutors", data = "<body>")]
pub async fn api_create_student_tutor(
    body: Result<Json<StudentTutorRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<StudentTutor>>, AppError> {
    let request = body.validate_body()?;
    let new = NewStudentTutor {
        student_id: request.student_id,
        tutor_id: request.tutor_id,
    };

    create_link::<StudentTutor>(db, &new).await
}

#[get("/students-tutors/<id>")]
pub async fn api_get_student_tutor(
    id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentTutor>, AppError> {
    let id = parse_id(id, "student tutor id")?;
    Ok(Json(StudentTutors::get(db, id).await?))
}

#[delete("/students-tutors/<id>")]
pub async fn api_delete_student_tutor(id: &str, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    delete_link::<StudentTutor>(db, id, "student tutor id").await
}

// Student subject completions

#[derive(Deserialize, Validate, Debug)]
pub struct CompletionRequest {
    pub student_id: i64,
    pub subject_id: i64,
}

#[get("/students-subjects?<student_id>&<subject_id>")]
pub async fn api_list_completions(
    student_id: Option<&str>,
    subject_id: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<StudentSubjectCompletion>>, AppError> {
    let filters = first_filter(&[
        RawFilter::Id("student_id", student_id),
        RawFilter::Id("subject_id", subject_id),
    ])?;

    Ok(Json(Completions::list(db, &filters).await?))
}

#[post("/students-subjects", data = "<body>")]
pub async fn api_create_completion(
    body: Result<Json<CompletionRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<StudentSubjectCompletion>>, AppError> {
    let request = body.validate_body()?;
    let new = NewCompletion {
        student_id: request.student_id,
        subject_id: request.subject_id,
    };

    create_link::<StudentSubjectCompletion>(db, &new).await
}

#[get("/students-subjects/<id>")]
pub async fn api_get_completion(
    id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentSubjectCompletion>, AppError> {
    let id = parse_id(id, "completion id")?;
    Ok(Json(Completions::get(db, id).await?))
}

#[delete("/students-subjects/<id>")]
pub async fn api_delete_completion(id: &str, db: &State<Pool<Sqlite>>) -> Result<Status, AppError> {
    delete_link::<StudentSubjectCompletion>(db, id, "completion id").await
}

// Discord identities

#[derive(Deserialize, Validate, Debug)]
pub struct StudentDiscordRequest {
    pub student_id: i64,
    #[validate(length(min = 1, message = "Discord ID is required"))]
    pub discord_id: String,
}

#[derive(Deserialize, Validate, Debug)]
pub struct TutorDiscordRequest {
    pub tutor_id: i64,
    #[validate(length(min = 1, message = "Discord ID is required"))]
    pub discord_id: String,
}

#[get("/student-discords?<discord_id>&<student_id>")]
pub async fn api_list_student_discords(
    discord_id: Option<&str>,
    student_id: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<StudentDiscord>>, AppError> {
    let filters = first_filter(&[
        RawFilter::Text("discord_id", discord_id),
        RawFilter::Id("student_id", student_id),
    ])?;

    Ok(Json(StudentDiscords::list(db, &filters).await?))
}

#[post("/student-discords", data = "<body>")]
pub async fn api_create_student_discord(
    body: Result<Json<StudentDiscordRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<StudentDiscord>>, AppError> {
    let request = body.validate_body()?;
    let new = NewStudentDiscord {
        student_id: request.student_id,
        discord_id: request.discord_id,
    };

    create_link::<StudentDiscord>(db, &new).await
}

#[get("/student-discords/<student_id>")]
pub async fn api_get_student_discord(
    student_id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentDiscord>, AppError> {
    let student_id = parse_id(student_id, "student id")?;
    Ok(Json(StudentDiscords::get(db, student_id).await?))
}

#[delete("/student-discords/<student_id>")]
pub async fn api_delete_student_discord(
    student_id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    delete_link::<StudentDiscord>(db, student_id, "student id").await
}

#[get("/tutor-discords?<discord_id>&<tutor_id>")]
pub async fn api_list_tutor_discords(
    discord_id: Option<&str>,
    tutor_id: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<TutorDiscord>>, AppError> {
    let filters = first_filter(&[
        RawFilter::Text("discord_id", discord_id),
        RawFilter::Id("tutor_id", tutor_id),
    ])?;

    Ok(Json(TutorDiscords::list(db, &filters).await?))
}

#[post("/tutor-discords", data = "<body>")]
pub async fn api_create_tutor_discord(
    body: Result<Json<TutorDiscordRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<TutorDiscord>>, AppError> {
    let request = body.validate_body()?;
    let new = NewTutorDiscord {
        tutor_id: request.tutor_id,
        discord_id: request.discord_id,
    };

    create_link::<TutorDiscord>(db, &new).await
}

#[get("/tutor-discords/<tutor_id>")]
pub async fn api_get_tutor_discord(
    tutor_id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TutorDiscord>, AppError> {
    let tutor_id = parse_id(tutor_id, "tutor id")?;
    Ok(Json(TutorDiscords::get(db, tutor_id).await?))
}

#[delete("/tutor-discords/<tutor_id>")]
pub async fn api_delete_tutor_discord(
    tutor_id: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, AppError> {
    delete_link::<TutorDiscord>(db, tutor_id, "tutor id").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_precedence_filter_is_not_parsed() {
        let filters = first_filter(&[
            RawFilter::Id("tutor_id", Some("2")),
            RawFilter::Id("student_id", Some("abc")),
        ])
        .expect("Ignored filter should not be parsed");

        assert_eq!(filters, vec![LinkFilter::id("tutor_id", 2)]);
    }

    #[test]
    fn empty_values_fall_through() {
        let filters = first_filter(&[
            RawFilter::Text("discord_id", Some("")),
            RawFilter::Id("student_id", Some("7")),
        ])
        .expect("Failed to pick filter");

        assert_eq!(filters, vec![LinkFilter::id("student_id", 7)]);
        assert!(first_filter(&[RawFilter::Id("tutor_id", None)])
            .expect("No filter is valid")
            .is_empty());
    }

    #[test]
    fn chosen_filter_still_validates() {
        let result = first_filter(&[
            RawFilter::Id("tutor_id", Some("x")),
            RawFilter::Id("student_id", Some("1")),
        ]);

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
