use crate::auth::repo_types::{LoginCandidate, LoginLogRow, UserRow};
use crate::errors::AppError;
use sqlx::PgConnection;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, user_uuid, email, display_name, avatar_url, location, created_at";

/// User by email together with their credential, in one round trip so a
/// known and an unknown email cost the same number of queries.
pub async fn find_login_candidate(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<LoginCandidate>, AppError> {
    let candidate = sqlx::query_as::<_, LoginCandidate>(
        r#"
        SELECT u.id, u.user_uuid, u.email, u.display_name, u.avatar_url, u.location, u.created_at,
               p.password_hash
        FROM users u
        LEFT JOIN user_passwords p ON p.user_id = u.id
        WHERE u.email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(candidate)
}

/// Find a user by public id.
pub async fn find_by_uuid(conn: &mut PgConnection, user_uuid: Uuid) -> Result<Option<UserRow>, AppError> {
    let user = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_uuid = $1"
    ))
    .bind(user_uuid)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(user)
}

/// Insert a new user. The unique index on `email` is the authoritative
/// duplicate check; its violation maps to `AlreadyExists`.
pub async fn insert_user(conn: &mut PgConnection, email: &str) -> Result<UserRow, AppError> {
    let user_uuid = Uuid::new_v4();
    let result = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (user_uuid, email, display_name)
        VALUES ($1, $2, $3)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_uuid)
    .bind(email)
    .bind(user_uuid.to_string())
    .fetch_one(&mut *conn)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(e) if AppError::is_unique_violation(&e) => Err(AppError::user_already_exists()),
        Err(e) => Err(AppError::Database(e)),
    }
}

pub async fn insert_login_log(
    conn: &mut PgConnection,
    user_id: i64,
    ip: &str,
) -> Result<LoginLogRow, AppError> {
    let row = sqlx::query_as::<_, LoginLogRow>(
        r#"
        INSERT INTO user_login_logs (user_id, ip_address)
        VALUES ($1, $2)
        RETURNING ip_address, login_at
        "#,
    )
    .bind(user_id)
    .bind(ip)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Most recent login of a user, if any.
pub async fn latest_login_log(
    conn: &mut PgConnection,
    user_id: i64,
) -> Result<Option<LoginLogRow>, AppError> {
    let row = sqlx::query_as::<_, LoginLogRow>(
        r#"
        SELECT ip_address, login_at
        FROM user_login_logs
        WHERE user_id = $1
        ORDER BY login_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}
