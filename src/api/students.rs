use rocket::State;
use rocket::serde::json::{self, Json};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::db::{NameFilter, create_student, get_student, list_students, update_student};
use crate::error::AppError;
use crate::models::Student;
use crate::validation::{JsonValidateExt, parse_id};

#[derive(Deserialize, Validate, Debug)]
pub struct StudentRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[get("/students?<q>")]
pub async fn api_list_students(
    q: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Student>>, AppError> {
    let students = list_students(db, &NameFilter::from_query(q)).await?;
    Ok(Json(students))
}

#[post("/students", data = "<body>")]
pub async fn api_create_student(
    body: Result<Json<StudentRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Student>, AppError> {
    let request = body.validate_body()?;

    let student = create_student(db, &request.name).await?;
    Ok(Json(student))
}

#[get("/students/<id>")]
pub async fn api_get_student(id: &str, db: &State<Pool<Sqlite>>) -> Result<Json<Student>, AppError> {
    let id = parse_id(id, "student id")?;

    let student = get_student(db, id).await?;
    Ok(Json(student))
}

#[put("/students/<id>", data = "<body>")]
pub async fn api_update_student(
    id: &str,
    body: Result<Json<StudentRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Student>, AppError> {
    let id = parse_id(id, "student id")?;
    let request = body.validate_body()?;

    let student = update_student(db, id, &request.name).await?;
    Ok(Json(student))
}

// Older clients update students with POST.
#[post("/students/<id>", data = "<body>")]
pub async fn api_update_student_post(
    id: &str,
    body: Result<Json<StudentRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Student>, AppError> {
    api_update_student(id, body, db).await
}
