use rocket::State;
use rocket::serde::json::{self, Json};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::db::{NameFilter, TutorFields, create_tutor, get_tutor, list_tutors, update_tutor};
use crate::error::AppError;
use crate::models::Tutor;
use crate::validation::{JsonValidateExt, parse_id};

#[derive(Deserialize, Validate, Debug)]
pub struct TutorRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub role_id: String,
    pub channel_id: String,
}

impl From<TutorRequest> for TutorFields {
    fn from(request: TutorRequest) -> Self {
        Self {
            name: request.name,
            role_id: request.role_id,
            channel_id: request.channel_id,
        }
    }
}

#[get("/tutors?<q>")]
pub async fn api_list_tutors(
    q: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Tutor>>, AppError> {
    let tutors = list_tutors(db, &NameFilter::from_query(q)).await?;
    Ok(Json(tutors))
}

#[post("/tutors", data = "<body>")]
pub async fn api_create_tutor(
    body: Result<Json<TutorRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Tutor>, AppError> {
    let fields = TutorFields::from(body.validate_body()?);

    let tutor = create_tutor(db, &fields).await?;
    Ok(Json(tutor))
}

#[get("/tutors/<id>")]
pub async fn api_get_tutor(id: &str, db: &State<Pool<Sqlite>>) -> Result<Json<Tutor>, AppError> {
    let id = parse_id(id, "tutor id")?;

    let tutor = get_tutor(db, id).await?;
    Ok(Json(tutor))
}

#[put("/tutors/<id>", data = "<body>")]
pub async fn api_update_tutor(
    id: &str,
    body: Result<Json<TutorRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Tutor>, AppError> {
    let id = parse_id(id, "tutor id")?;
    let fields = TutorFields::from(body.validate_body()?);

    let tutor = update_tutor(db, id, &fields).await?;
    Ok(Json(tutor))
}
