use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. `id` is internal and only used for joins.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub user_uuid: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub created_at: OffsetDateTime,
}

/// User plus their stored hash, if they have a credential row.
#[derive(Debug, Clone, FromRow)]
pub struct LoginCandidate {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub password_hash: Option<String>,
}

/// Append-only audit row written on every successful login.
#[derive(Debug, Clone, FromRow)]
pub struct LoginLogRow {
    pub ip_address: String,
    pub login_at: OffsetDateTime,
}
