//! Seeding helpers for database-backed tests.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub async fn insert_bare_user(conn: &mut PgConnection, email: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (user_uuid, email) VALUES ($1, $2) RETURNING id")
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(&mut *conn)
        .await
        .expect("insert user")
}

pub async fn user_uuid(pool: &PgPool, user_id: i64) -> Uuid {
    sqlx::query_scalar("SELECT user_uuid FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("user uuid")
}

pub async fn user_count(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("count users")
}

pub async fn login_log_count(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_login_logs l JOIN users u ON u.id = l.user_id WHERE u.email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("count login logs")
}

pub struct QuestionSeed {
    pub category: &'static str,
    pub difficulty: &'static str,
    pub likes: i64,
    pub submit_count: i64,
    pub correct_count: i64,
    pub public: bool,
    pub published: bool,
    pub created_by: Option<i64>,
    /// `(language, question_text)` pairs.
    pub translations: Vec<(&'static str, String)>,
}

impl Default for QuestionSeed {
    fn default() -> Self {
        Self {
            category: "character",
            difficulty: "easy",
            likes: 0,
            submit_count: 0,
            correct_count: 0,
            public: true,
            published: true,
            created_by: None,
            translations: vec![("en", "Which element does Diluc use?".to_string())],
        }
    }
}

/// Inserts the question and its translations; returns `(id, uuid)`.
pub async fn seed_question(conn: &mut PgConnection, seed: QuestionSeed) -> (i64, Uuid) {
    let uuid = Uuid::new_v4();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (question_uuid, created_by, category, difficulty, public, is_published,
                               published_at, likes, submit_count, correct_count)
        VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $6 THEN NOW() END, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(uuid)
    .bind(seed.created_by)
    .bind(seed.category)
    .bind(seed.difficulty)
    .bind(seed.public)
    .bind(seed.published)
    .bind(seed.likes)
    .bind(seed.submit_count)
    .bind(seed.correct_count)
    .fetch_one(&mut *conn)
    .await
    .expect("insert question");

    for (language, text) in seed.translations {
        sqlx::query(
            "INSERT INTO question_translations (question_id, language, question_text, explanation) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(language)
        .bind(text)
        .bind(format!("explanation ({language})"))
        .execute(&mut *conn)
        .await
        .expect("insert translation");
    }
    (id, uuid)
}

/// Adds an option with one English text; returns its internal id.
pub async fn seed_option(conn: &mut PgConnection, question_id: i64, text: &str, is_answer: bool, sort_order: i32) -> i64 {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO question_options (option_uuid, question_id, is_answer, sort_order) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(question_id)
    .bind(is_answer)
    .bind(sort_order)
    .fetch_one(&mut *conn)
    .await
    .expect("insert option");
    sqlx::query("INSERT INTO option_translations (option_id, language, option_text) VALUES ($1, 'en', $2)")
        .bind(id)
        .bind(text)
        .execute(&mut *conn)
        .await
        .expect("insert option translation");
    id
}

pub async fn seed_submission(
    conn: &mut PgConnection,
    question_id: i64,
    user_id: i64,
    selected: &[i64],
    is_correct: bool,
) {
    sqlx::query(
        "INSERT INTO question_submissions (question_id, user_id, selected_option_ids, is_correct) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(question_id)
    .bind(user_id)
    .bind(selected)
    .bind(is_correct)
    .execute(&mut *conn)
    .await
    .expect("insert submission");
}
