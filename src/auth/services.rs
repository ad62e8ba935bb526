use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{user_to_dto, UserDto},
        jwt::JwtKeys,
        password, repo,
        repo_types::UserRow,
    },
    cancel::cancellable,
    errors::AppError,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Token plus user view returned by a successful register or login.
#[derive(Debug)]
pub struct AuthSession {
    pub token: String,
    pub user: UserDto,
}

/// Steps of the write transaction, recorded when one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    CreateUser,
    CreatePassword,
    IssueToken,
    WriteLoginLog,
    Commit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CreateUser => "create_user",
            Step::CreatePassword => "create_password",
            Step::IssueToken => "issue_token",
            Step::WriteLoginLog => "write_login_log",
            Step::Commit => "commit",
        };
        f.write_str(name)
    }
}

type StepResult<T> = Result<T, (Step, AppError)>;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::invalid_input("Invalid email"));
    }
    Ok(email)
}

/// Create a user with a password credential, sign a session token and record
/// the first login, all in one transaction. A concurrent registration of the
/// same email loses on the unique index and gets `AlreadyExists`.
#[instrument(skip_all)]
pub async fn register_user(
    db: &PgPool,
    keys: &JwtKeys,
    email: &str,
    password: &str,
    source_ip: &str,
    cancel: &CancellationToken,
) -> Result<AuthSession, AppError> {
    cancellable(cancel, async {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input("Password too short"));
        }
        let hash = password::hash_password_blocking(password.to_string()).await?;

        let mut tx = db.begin().await?;
        let outcome = register_in_tx(&mut *tx, keys, &email, &hash, source_ip).await;
        let session = finish(tx, outcome).await?;
        info!(user_id = %session.user.uuid, "user registered");
        Ok(session)
    })
    .await
}

/// Verify email and password, then sign a token and append a login-log row.
/// An unknown email, a user without a credential and a wrong password all
/// end in the same `InvalidCredentials`.
#[instrument(skip_all)]
pub async fn login_user(
    db: &PgPool,
    keys: &JwtKeys,
    email: &str,
    password: &str,
    source_ip: &str,
    cancel: &CancellationToken,
) -> Result<AuthSession, AppError> {
    cancellable(cancel, async {
        let email = normalize_email(email)?;

        let mut conn = db.acquire().await?;
        let lookup = lookup_login_user(&mut *conn, &email).await;
        drop(conn);

        let (user, hash) = match lookup {
            Ok(found) => found,
            Err(AppError::NotFound { .. }) => {
                password::verify_password_blocking(None, password.to_string()).await?;
                warn!(email = %email, "login unknown email");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let ok = password::verify_password_blocking(hash, password.to_string()).await?;
        if !ok {
            warn!(email = %email, user_id = %user.user_uuid, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let mut tx = db.begin().await?;
        let outcome = issue_session(&mut *tx, keys, &user, source_ip).await;
        let session = finish(tx, outcome).await?;
        info!(user_id = %user.user_uuid, "user logged in");
        Ok(session)
    })
    .await
}

/// Profile of the authenticated caller with their latest login.
#[instrument(skip(db, cancel))]
pub async fn current_user(
    db: &PgPool,
    user_uuid: Uuid,
    cancel: &CancellationToken,
) -> Result<UserDto, AppError> {
    cancellable(cancel, async {
        let mut conn = db.acquire().await?;
        let user = repo::find_by_uuid(&mut *conn, user_uuid)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "user",
                id: user_uuid.to_string(),
            })?;
        let login = repo::latest_login_log(&mut *conn, user.id).await?;
        Ok(user_to_dto(&user, login.as_ref()))
    })
    .await
}

/// User by email plus their stored hash, from a single query. `NotFound`
/// when the email is unknown; `None` hash when the user has no credential
/// row.
async fn lookup_login_user(
    conn: &mut PgConnection,
    email: &str,
) -> Result<(UserRow, Option<String>), AppError> {
    let candidate = repo::find_login_candidate(conn, email)
        .await?
        .ok_or_else(|| AppError::user_not_found(email))?;
    let hash = match password::stored_hash(&candidate) {
        Ok(hash) => Some(hash.to_string()),
        Err(AppError::CredentialMissing) => {
            warn!(user_id = %candidate.user.user_uuid, "user has no credential");
            None
        }
        Err(e) => return Err(e),
    };
    Ok((candidate.user, hash))
}

async fn register_in_tx(
    conn: &mut PgConnection,
    keys: &JwtKeys,
    email: &str,
    password_hash: &str,
    source_ip: &str,
) -> StepResult<AuthSession> {
    let user = repo::insert_user(conn, email)
        .await
        .map_err(|e| (Step::CreateUser, e))?;
    password::upsert_credential(conn, user.id, password_hash)
        .await
        .map_err(|e| (Step::CreatePassword, e))?;
    issue_session(conn, keys, &user, source_ip).await
}

async fn issue_session(
    conn: &mut PgConnection,
    keys: &JwtKeys,
    user: &UserRow,
    source_ip: &str,
) -> StepResult<AuthSession> {
    let token = keys
        .sign(user.user_uuid, &user.email)
        .map_err(|e| (Step::IssueToken, e))?;
    let login = repo::insert_login_log(conn, user.id, source_ip)
        .await
        .map_err(|e| (Step::WriteLoginLog, e))?;
    Ok(AuthSession {
        token,
        user: user_to_dto(user, Some(&login)),
    })
}

/// Commit on success; otherwise roll back and surface the first error.
async fn finish<T>(tx: Transaction<'static, Postgres>, outcome: StepResult<T>) -> Result<T, AppError> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                error!(step = %Step::Commit, error = %e, "auth transaction commit failed");
                AppError::Database(e)
            })?;
            Ok(value)
        }
        Err((step, err)) => {
            match &err {
                AppError::AlreadyExists { .. } => warn!(step = %step, "email already registered"),
                _ => error!(step = %step, error = %err, "auth transaction failed"),
            }
            if let Err(rb) = tx.rollback().await {
                error!(error = %rb, "rollback failed");
            }
            Err(err)
        }
    }
}
