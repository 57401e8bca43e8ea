use std::path::{Path, PathBuf};

use rocket::http::{Method, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::error::{AppError, ErrorResponse};
use crate::reset::reset_all;

/// Paths answering to a single resource name, e.g. `/students`.
const RESOURCES: [&str; 9] = [
    "students",
    "tutors",
    "subjects",
    "students-tutors",
    "students-subjects",
    "student-discords",
    "tutor-discords",
    "reset",
    "healthz",
];

/// Resources that also accept a trailing key, e.g. `/students/4`.
const KEYED_RESOURCES: [&str; 7] = [
    "students",
    "tutors",
    "subjects",
    "students-tutors",
    "students-subjects",
    "student-discords",
    "tutor-discords",
];

#[derive(Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}

#[get("/healthz")]
pub fn health() -> &'static str {
    "OK"
}

#[post("/reset")]
pub async fn api_reset(db: &State<Pool<Sqlite>>) -> Result<Json<StatusResponse>, AppError> {
    reset_all(db).await?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// Error for a request no route handled: 405 when the path names a known
/// resource, 404 otherwise.
pub fn unmatched(method: Method, path: &Path) -> AppError {
    let segments: Vec<&str> = path.iter().filter_map(|s| s.to_str()).collect();

    let known = match segments.as_slice() {
        [resource] => RESOURCES.contains(resource),
        [resource, _] => KEYED_RESOURCES.contains(resource),
        _ => false,
    };

    if known {
        AppError::MethodNotAllowed(format!("{} is not supported on /{}", method, path.display()))
    } else {
        AppError::NotFound(format!("No resource at /{}", path.display()))
    }
}

#[get("/<path..>", rank = 100)]
pub fn fallback_get(path: PathBuf) -> AppError {
    unmatched(Method::Get, &path)
}

#[post("/<path..>", rank = 100)]
pub fn fallback_post(path: PathBuf) -> AppError {
    unmatched(Method::Post, &path)
}

#[put("/<path..>", rank = 100)]
pub fn fallback_put(path: PathBuf) -> AppError {
    unmatched(Method::Put, &path)
}

#[delete("/<path..>", rank = 100)]
pub fn fallback_delete(path: PathBuf) -> AppError {
    unmatched(Method::Delete, &path)
}

#[patch("/<path..>", rank = 100)]
pub fn fallback_patch(path: PathBuf) -> AppError {
    unmatched(Method::Patch, &path)
}

#[options("/<path..>", rank = 100)]
pub fn fallback_options(path: PathBuf) -> AppError {
    unmatched(Method::Options, &path)
}

#[catch(default)]
pub fn default_catcher(status: Status, req: &Request<'_>) -> Custom<Json<ErrorResponse>> {
    let message = format!(
        "{} while handling {} {}",
        status.reason().unwrap_or("Error"),
        req.method(),
        req.uri()
    );

    Custom(status, Json(ErrorResponse::new(status, message)))
}
