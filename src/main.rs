#[macro_use]
extern crate rocket;

mod api;
mod association;
mod categories;
mod database;
mod db;
mod env;
mod error;
mod models;
mod reset;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use std::sync::Mutex;

use api::{
    api_create_completion, api_create_student, api_create_student_discord,
    api_create_student_tutor, api_create_subject, api_create_tutor, api_create_tutor_discord,
    api_delete_completion, api_delete_student_discord, api_delete_student_tutor,
    api_delete_tutor_discord, api_get_completion, api_get_student, api_get_student_discord,
    api_get_student_tutor, api_get_subject, api_get_tutor, api_get_tutor_discord,
    api_list_completions, api_list_student_discords, api_list_student_tutors, api_list_students,
    api_list_subjects, api_list_tutor_discords, api_list_tutors, api_reset, api_update_student,
    api_update_student_post, api_update_subject, api_update_tutor, default_catcher,
    fallback_delete, fallback_get, fallback_options, fallback_patch, fallback_post, fallback_put,
    health,
};
use env::{Settings, load_environment};
use error::AppError;
use once_cell::sync::Lazy;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use sqlx::SqlitePool;
use telemetry::{OtelGuard, TelemetryFairing, init_tracing, shutdown_telemetry};
use thiserror::Error;
use tracing::{error, info};

pub static TELEMETRY_GUARD: Lazy<Mutex<Option<OtelGuard>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

async fn setup() -> Result<(SqlitePool, Settings), Error> {
    if let Err(e) = load_environment() {
        return Err(Error::Anyhow(anyhow::anyhow!("Failed to load environment: {}", e)));
    }

    let settings = Settings::from_env()?;
    info!(policy = %settings.substep_policy, "Loaded settings");

    let pool = database::connect(&settings.database_url).await?;

    Ok((pool, settings))
}

#[launch]
async fn rocket() -> _ {
    init_tracing();

    match setup().await {
        Ok((pool, settings)) => init_rocket(pool, settings).await,
        Err(e) => {
            error!("Failed to start: {}", e);
            panic!("Startup failed: {}", e);
        }
    }
}

pub async fn init_rocket(pool: SqlitePool, settings: Settings) -> Rocket<Build> {
    info!("Starting tutoria");

    rocket::build()
        .manage(pool)
        .manage(settings)
        .mount(
            "/",
            routes![
                health,
                api_reset,
                api_list_students,
                api_create_student,
                api_get_student,
                api_update_student,
                api_update_student_post,
                api_list_tutors,
                api_create_tutor,
                api_get_tutor,
                api_update_tutor,
                api_list_subjects,
                api_create_subject,
                api_get_subject,
                api_update_subject,
                api_list_student_tutors,
                api_create_student_tutor,
                api_get_student_tutor,
                api_delete_student_tutor,
                api_list_completions,
                api_create_completion,
                api_get_completion,
                api_delete_completion,
                api_list_student_discords,
                api_create_student_discord,
                api_get_student_discord,
                api_delete_student_discord,
                api_list_tutor_discords,
                api_create_tutor_discord,
                api_get_tutor_discord,
                api_delete_tutor_discord,
                fallback_get,
                fallback_post,
                fallback_put,
                fallback_delete,
                fallback_patch,
                fallback_options,
            ],
        )
        .register("/", catchers![default_catcher])
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async { shutdown_telemetry() })
        }))
}
