#[cfg(test)]
mod tests {
    use crate::association::{Completions, NewCompletion, NewStudentTutor, StudentTutors};
    use crate::reset::{RESET_ORDER, reset_all};
    use crate::test::test_utils::create_standard_test_db;

    #[test]
    fn test_reset_order() {
        let resources: Vec<&str> = RESET_ORDER.iter().map(|(resource, _)| *resource).collect();
        assert_eq!(resources, vec!["categories", "students", "tutors", "subjects"]);
    }

    #[rocket::async_test]
    async fn test_reset_clears_everything() {
        let test_db = create_standard_test_db().await;
        StudentTutors::create(
            &test_db.pool,
            &NewStudentTutor {
                student_id: test_db.student_id("Alice"),
                tutor_id: test_db.tutor_id("Carol"),
            },
        )
        .await
        .expect("Failed to create student tutor");
        Completions::create(
            &test_db.pool,
            &NewCompletion {
                student_id: test_db.student_id("Bob"),
                subject_id: test_db.subject_id("PHY101"),
            },
        )
        .await
        .expect("Failed to create completion");

        reset_all(&test_db.pool).await.expect("Failed to reset");

        for table in [
            "categories",
            "students",
            "tutors",
            "subjects",
            "subject_categories",
            "student_tutors",
            "student_subject_completions",
            "student_discords",
            "tutor_discords",
        ] {
            assert_eq!(test_db.count(table).await, 0, "{} not cleared", table);
        }
    }

    #[rocket::async_test]
    async fn test_reset_stops_at_failing_step() {
        let test_db = create_standard_test_db().await;
        test_db.lock_table("tutors").await;

        let err = reset_all(&test_db.pool)
            .await
            .expect_err("Reset should fail on tutors");
        assert_eq!(err.resource, "tutors");
        assert!(err.to_string().starts_with("Failed to reset tutors"));

        // Earlier steps stay applied, later ones never run.
        assert_eq!(test_db.count("categories").await, 0);
        assert_eq!(test_db.count("students").await, 0);
        assert_eq!(test_db.count("tutors").await, 2);
        assert_eq!(test_db.count("subjects").await, 2);
    }
}
