use std::collections::HashSet;

use sqlx::{Pool, Sqlite};
use tracing::{debug, info, instrument, warn};

use crate::db::{
    delete_subject_categories, get_category_by_name, insert_category, insert_subject_category,
    list_category_names_for_subject,
};
use crate::env::SubStepPolicy;
use crate::error::{AppError, ConstraintKind, ConstraintViolation};
use crate::models::{Category, Subject, SubjectView};

/// Looks a category up by name and creates it when missing.
///
/// A failed insert is not fatal on its own: a concurrent request may have
/// created the same name first, so the name is always looked up again.
#[instrument(skip(pool))]
pub async fn create_or_get_category(pool: &Pool<Sqlite>, name: &str) -> Result<Category, AppError> {
    if let Some(category) = get_category_by_name(pool, name).await? {
        return Ok(category);
    }

    if let Err(err) = insert_category(pool, name).await {
        match ConstraintViolation::classify(&err) {
            Some(v) if v.kind == ConstraintKind::Unique => {
                debug!(category = %name, "Category created concurrently")
            }
            _ => warn!(category = %name, error = %err, "Failed to insert category"),
        }
    }

    get_category_by_name(pool, name)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Category '{}' could not be resolved", name)))
}

/// Links each named category to a freshly created subject.
#[instrument(skip(pool))]
pub async fn attach_subject_categories(
    pool: &Pool<Sqlite>,
    subject_id: i64,
    names: &[String],
    policy: SubStepPolicy,
) -> Result<(), AppError> {
    info!("Attaching categories to subject");
    for name in unique_names(names) {
        let category = match create_or_get_category(pool, name).await {
            Ok(category) => category,
            Err(err) => {
                policy.handle(err, &format!("resolve category '{}'", name))?;
                continue;
            }
        };

        if let Err(err) = insert_subject_category(pool, subject_id, category.id).await {
            policy.handle(err, &format!("link category '{}'", name))?;
        }
    }

    Ok(())
}

/// Drops every category link of the subject, then links `names`.
#[instrument(skip(pool))]
pub async fn replace_subject_categories(
    pool: &Pool<Sqlite>,
    subject_id: i64,
    names: &[String],
    policy: SubStepPolicy,
) -> Result<(), AppError> {
    let removed = delete_subject_categories(pool, subject_id).await?;
    debug!(removed, "Removed previous category links");

    attach_subject_categories(pool, subject_id, names, policy).await
}

#[instrument(skip(pool))]
pub async fn compose_subject_view(
    pool: &Pool<Sqlite>,
    subject: Subject,
    policy: SubStepPolicy,
) -> Result<SubjectView, AppError> {
    let categories = match list_category_names_for_subject(pool, subject.id).await {
        Ok(names) => names,
        Err(err) => {
            policy.handle(err, &format!("load categories of subject {}", subject.id))?;
            Vec::new()
        }
    };

    Ok(SubjectView::new(subject, categories))
}

pub async fn compose_subject_views(
    pool: &Pool<Sqlite>,
    subjects: Vec<Subject>,
    policy: SubStepPolicy,
) -> Result<Vec<SubjectView>, AppError> {
    let mut views = Vec::with_capacity(subjects.len());
    for subject in subjects {
        views.push(compose_subject_view(pool, subject, policy).await?);
    }

    Ok(views)
}

// Repeated names would collide on the link table's primary key.
fn unique_names(names: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(move |name| seen.insert(*name))
}
