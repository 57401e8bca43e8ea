#[cfg(test)]
mod tests {
    use crate::categories::{
        attach_subject_categories, compose_subject_view, create_or_get_category,
        replace_subject_categories,
    };
    use crate::db::{
        NameFilter, SubjectFields, create_subject, get_subject, list_subjects, update_subject,
    };
    use crate::env::SubStepPolicy;
    use crate::error::AppError;
    use crate::test::test_utils::{TestDbBuilder, create_standard_test_db};

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn fields(code: &str) -> SubjectFields {
        SubjectFields {
            code: code.to_string(),
            name: "Organic Chemistry".to_string(),
            description: Some("Carbon compounds".to_string()),
            class: "C".to_string(),
        }
    }

    #[rocket::async_test]
    async fn test_categories_follow_latest_write() {
        let test_db = TestDbBuilder::new().build().await.expect("Failed to build test database");
        let subject = create_subject(&test_db.pool, &fields("CHE201"))
            .await
            .expect("Failed to create subject");

        attach_subject_categories(&test_db.pool, subject.id, &names(&["math", "physics"]), SubStepPolicy::Abort)
            .await
            .expect("Failed to attach categories");
        let view = compose_subject_view(&test_db.pool, subject.clone(), SubStepPolicy::Abort)
            .await
            .expect("Failed to compose subject");
        assert_eq!(view.categories, names(&["math", "physics"]));

        replace_subject_categories(&test_db.pool, subject.id, &names(&["physics", "chem"]), SubStepPolicy::Abort)
            .await
            .expect("Failed to replace categories");
        let view = compose_subject_view(&test_db.pool, subject, SubStepPolicy::Abort)
            .await
            .expect("Failed to compose subject");
        assert_eq!(view.categories, names(&["chem", "physics"]));

        // Categories outlive the links that used them.
        assert_eq!(test_db.categories_named("math").await, 1);
        assert_eq!(test_db.categories_named("physics").await, 1);
    }

    #[rocket::async_test]
    async fn test_repeated_category_names_link_once() {
        let test_db = TestDbBuilder::new().build().await.expect("Failed to build test database");
        let subject = create_subject(&test_db.pool, &fields("CHE202"))
            .await
            .expect("Failed to create subject");

        attach_subject_categories(&test_db.pool, subject.id, &names(&["lab", "lab"]), SubStepPolicy::Abort)
            .await
            .expect("Failed to attach categories");

        assert_eq!(test_db.count("subject_categories").await, 1);
        assert_eq!(test_db.categories_named("lab").await, 1);
    }

    #[rocket::async_test]
    async fn test_concurrent_create_or_get_yields_one_category() {
        let test_db = TestDbBuilder::new().build().await.expect("Failed to build test database");

        let (first, second) = tokio::join!(
            create_or_get_category(&test_db.pool, "algebra"),
            create_or_get_category(&test_db.pool, "algebra"),
        );
        let first = first.expect("First call failed");
        let second = second.expect("Second call failed");

        assert_eq!(first, second);
        assert_eq!(test_db.categories_named("algebra").await, 1);

        let again = create_or_get_category(&test_db.pool, "algebra")
            .await
            .expect("Repeat call failed");
        assert_eq!(again.id, first.id);
    }

    #[rocket::async_test]
    async fn test_skipped_category_keeps_the_rest() {
        let test_db = TestDbBuilder::new().build().await.expect("Failed to build test database");
        test_db.reject_category("broken").await;
        let subject = create_subject(&test_db.pool, &fields("CHE203"))
            .await
            .expect("Failed to create subject");

        attach_subject_categories(
            &test_db.pool,
            subject.id,
            &names(&["math", "broken", "physics"]),
            SubStepPolicy::SkipAndLog,
        )
        .await
        .expect("Skip policy should swallow the failed category");

        let view = compose_subject_view(&test_db.pool, subject, SubStepPolicy::SkipAndLog)
            .await
            .expect("Failed to compose subject");
        assert_eq!(view.categories, names(&["math", "physics"]));
        assert_eq!(test_db.categories_named("broken").await, 0);
    }

    #[rocket::async_test]
    async fn test_abort_policy_surfaces_category_failure() {
        let test_db = TestDbBuilder::new().build().await.expect("Failed to build test database");
        test_db.reject_category("broken").await;
        let subject = create_subject(&test_db.pool, &fields("CHE204"))
            .await
            .expect("Failed to create subject");

        let result = attach_subject_categories(
            &test_db.pool,
            subject.id,
            &names(&["math", "broken", "physics"]),
            SubStepPolicy::Abort,
        )
        .await;
        assert!(matches!(result, Err(AppError::Internal(_))));

        // Steps before the failure stay applied.
        let view = compose_subject_view(&test_db.pool, subject.clone(), SubStepPolicy::Abort)
            .await
            .expect("Failed to compose subject");
        assert_eq!(view.categories, names(&["math"]));
        assert!(get_subject(&test_db.pool, subject.id).await.is_ok());
    }

    #[rocket::async_test]
    async fn test_view_falls_back_to_no_categories() {
        let test_db = create_standard_test_db().await;
        let subject = get_subject(&test_db.pool, test_db.subject_id("PHY101"))
            .await
            .expect("Failed to fetch subject");

        sqlx::raw_sql("DROP TABLE subject_categories")
            .execute(&test_db.pool)
            .await
            .expect("Failed to drop link table");

        let view = compose_subject_view(&test_db.pool, subject.clone(), SubStepPolicy::SkipAndLog)
            .await
            .expect("Skip policy should still return the subject");
        assert_eq!(view.code, "PHY101");
        assert!(view.categories.is_empty());

        let result = compose_subject_view(&test_db.pool, subject, SubStepPolicy::Abort).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[rocket::async_test]
    async fn test_subject_code_is_unique() {
        let test_db = create_standard_test_db().await;

        let duplicate = create_subject(&test_db.pool, &fields("MAT101")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let id = test_db.subject_id("PHY101");
        let renamed = update_subject(&test_db.pool, id, &fields("MAT101")).await;
        assert!(matches!(renamed, Err(AppError::Conflict(_))));

        let missing = update_subject(&test_db.pool, 9999, &fields("NEW100")).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_missing_description_reads_as_empty() {
        let test_db = create_standard_test_db().await;

        let subject = get_subject(&test_db.pool, test_db.subject_id("MAT101"))
            .await
            .expect("Failed to fetch subject");
        assert_eq!(subject.description, "");
    }

    #[rocket::async_test]
    async fn test_list_subjects_by_class_and_name() {
        let test_db = create_standard_test_db().await;

        let class_b = list_subjects(&test_db.pool, &NameFilter::All, Some("B"))
            .await
            .expect("Failed to list subjects");
        assert_eq!(class_b.len(), 1);
        assert_eq!(class_b[0].code, "PHY101");

        // A name search wins over the class filter.
        let by_name = list_subjects(&test_db.pool, &NameFilter::from_query(Some("Cal")), Some("B"))
            .await
            .expect("Failed to list subjects");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].code, "MAT101");

        let short = list_subjects(&test_db.pool, &NameFilter::from_query(Some("Ca")), None)
            .await
            .expect("Failed to list subjects");
        assert!(short.is_empty());
    }
}
