use rocket::State;
use rocket::serde::json::{self, Json};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::categories::{
    attach_subject_categories, compose_subject_view, compose_subject_views,
    replace_subject_categories,
};
use crate::db::{
    NameFilter, SubjectFields, create_subject, get_subject, list_subjects, update_subject,
};
use crate::env::Settings;
use crate::error::AppError;
use crate::models::SubjectView;
use crate::validation::{JsonValidateExt, non_empty, parse_id};

#[derive(Deserialize, Validate, Debug)]
pub struct SubjectRequest {
    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub class: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl SubjectRequest {
    // An empty description is stored as NULL.
    fn fields(&self) -> SubjectFields {
        SubjectFields {
            code: self.code.clone(),
            name: self.name.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            class: self.class.clone(),
        }
    }
}

#[get("/subjects?<q>&<class>")]
pub async fn api_list_subjects(
    q: Option<&str>,
    class: Option<&str>,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<Vec<SubjectView>>, AppError> {
    let subjects = list_subjects(db, &NameFilter::from_query(q), non_empty(class)).await?;

    let views = compose_subject_views(db, subjects, settings.substep_policy).await?;
    Ok(Json(views))
}

#[post("/subjects", data = "<body>")]
pub async fn api_create_subject(
    body: Result<Json<SubjectRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<SubjectView>, AppError> {
    let request = body.validate_body()?;

    let subject = create_subject(db, &request.fields()).await?;
    attach_subject_categories(db, subject.id, &request.categories, settings.substep_policy).await?;

    let view = compose_subject_view(db, subject, settings.substep_policy).await?;
    Ok(Json(view))
}

#[get("/subjects/<id>")]
pub async fn api_get_subject(
    id: &str,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<SubjectView>, AppError> {
    let id = parse_id(id, "subject id")?;

    let subject = get_subject(db, id).await?;
    let view = compose_subject_view(db, subject, settings.substep_policy).await?;
    Ok(Json(view))
}

#[put("/subjects/<id>", data = "<body>")]
pub async fn api_update_subject(
    id: &str,
    body: Result<Json<SubjectRequest>, json::Error<'_>>,
    db: &State<Pool<Sqlite>>,
    settings: &State<Settings>,
) -> Result<Json<SubjectView>, AppError> {
    let id = parse_id(id, "subject id")?;
    get_subject(db, id).await?;
    let request = body.validate_body()?;

    update_subject(db, id, &request.fields()).await?;
    replace_subject_categories(db, id, &request.categories, settings.substep_policy).await?;

    let subject = get_subject(db, id).await?;
    let view = compose_subject_view(db, subject, settings.substep_policy).await?;
    Ok(Json(view))
}
