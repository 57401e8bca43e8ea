#[cfg(test)]
pub mod test_utils {
    use std::collections::HashMap;
    use std::sync::Once;

    use rocket::local::asynchronous::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    use crate::categories::attach_subject_categories;
    use crate::database::apply_schema;
    use crate::db::{SubjectFields, TutorFields, create_student, create_subject, create_tutor};
    use crate::env::{Settings, SubStepPolicy};
    use crate::error::AppError;
    use crate::init_rocket;

    static INIT: Once = Once::new();

    #[derive(Default)]
    pub struct TestDbBuilder {
        students: Vec<String>,
        tutors: Vec<TutorFields>,
        subjects: Vec<TestSubject>,
    }

    pub struct TestSubject {
        pub fields: SubjectFields,
        pub categories: Vec<String>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn student(mut self, name: &str) -> Self {
            self.students.push(name.to_string());
            self
        }

        pub fn tutor(mut self, name: &str, role_id: &str, channel_id: &str) -> Self {
            self.tutors.push(TutorFields {
                name: name.to_string(),
                role_id: role_id.to_string(),
                channel_id: channel_id.to_string(),
            });
            self
        }

        pub fn subject(mut self, code: &str, name: &str, class: &str, categories: &[&str]) -> Self {
            self.subjects.push(TestSubject {
                fields: SubjectFields {
                    code: code.to_string(),
                    name: name.to_string(),
                    description: None,
                    class: class.to_string(),
                },
                categories: categories.iter().map(|c| c.to_string()).collect(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter("debug")
                    .with_test_writer()
                    .try_init();
            });

            // One connection keeps every query on the same in-memory database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            apply_schema(&pool).await?;

            let mut student_ids = HashMap::new();
            let mut tutor_ids = HashMap::new();
            let mut subject_ids = HashMap::new();

            for name in &self.students {
                let student = create_student(&pool, name).await?;
                student_ids.insert(name.clone(), student.id);
            }

            for tutor in &self.tutors {
                let created = create_tutor(&pool, tutor).await?;
                tutor_ids.insert(tutor.name.clone(), created.id);
            }

            for subject in &self.subjects {
                let created = create_subject(&pool, &subject.fields).await?;
                attach_subject_categories(
                    &pool,
                    created.id,
                    &subject.categories,
                    SubStepPolicy::Abort,
                )
                .await?;
                subject_ids.insert(subject.fields.code.clone(), created.id);
            }

            Ok(TestDb {
                pool,
                student_ids,
                tutor_ids,
                subject_ids,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub student_ids: HashMap<String, i64>,
        pub tutor_ids: HashMap<String, i64>,
        pub subject_ids: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn student_id(&self, name: &str) -> i64 {
            *self.student_ids.get(name).expect("student not seeded")
        }

        pub fn tutor_id(&self, name: &str) -> i64 {
            *self.tutor_ids.get(name).expect("tutor not seeded")
        }

        pub fn subject_id(&self, code: &str) -> i64 {
            *self.subject_ids.get(code).expect("subject not seeded")
        }

        pub async fn count(&self, table: &str) -> i64 {
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count rows")
        }

        pub async fn categories_named(&self, name: &str) -> i64 {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE name = ?")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count categories")
        }

        /// Makes inserts of the given category name fail inside the database.
        pub async fn reject_category(&self, name: &str) {
            let sql = format!(
                "CREATE TRIGGER reject_category BEFORE INSERT ON categories
                 WHEN NEW.name = '{}'
                 BEGIN SELECT RAISE(ABORT, 'category rejected'); END;",
                name
            );
            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .expect("Failed to install category trigger");
        }

        /// Makes every delete on `table` fail inside the database.
        pub async fn lock_table(&self, table: &str) {
            let sql = format!(
                "CREATE TRIGGER lock_{table} BEFORE DELETE ON {table}
                 BEGIN SELECT RAISE(ABORT, '{table} locked'); END;"
            );
            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .expect("Failed to install delete trigger");
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .student("Alice")
            .student("Alina")
            .student("Bob")
            .tutor("Carol", "role-1", "channel-1")
            .tutor("Dave", "role-2", "channel-2")
            .subject("MAT101", "Calculus", "A", &["math"])
            .subject("PHY101", "Mechanics", "B", &["physics", "math"])
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        setup_test_client_with(test_db, SubStepPolicy::SkipAndLog).await
    }

    pub async fn setup_test_client_with(test_db: TestDb, policy: SubStepPolicy) -> (Client, TestDb) {
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            substep_policy: policy,
        };

        let rocket = init_rocket(test_db.pool.clone(), settings).await;
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build rocket client");

        (client, test_db)
    }
}
