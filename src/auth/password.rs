use crate::auth::repo_types::LoginCandidate;
use crate::errors::AppError;
use lazy_static::lazy_static;
use sqlx::PgConnection;
use tracing::error;

lazy_static! {
    /// Verified against when there is no real hash to check, so a login
    /// for an unknown account costs the same as a wrong password.
    static ref DUMMY_HASH: String =
        bcrypt::hash("quizhub-timing-equaliser", bcrypt::DEFAULT_COST)
            .unwrap_or_default();
}

/// Hash a plaintext password with bcrypt at the library's default cost.
/// A fresh salt is drawn on every call.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    if plain.is_empty() {
        return Err(AppError::invalid_input("password must not be empty"));
    }
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        AppError::Internal(anyhow::anyhow!(e.to_string()))
    })
}

/// Check `plain` against a stored hash. A mismatch is `Ok(false)`;
/// only an unparseable hash is an error.
pub fn verify_password(hash: &str, plain: &str) -> Result<bool, AppError> {
    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt parse hash error");
        AppError::Internal(anyhow::anyhow!(e.to_string()))
    })
}

/// Burn one verification's worth of CPU and always report a mismatch.
pub fn verify_against_dummy(plain: &str) -> bool {
    let _ = bcrypt::verify(plain, DUMMY_HASH.as_str());
    false
}

/// Hash carried by a login lookup, or `CredentialMissing` when the user has
/// no credential row.
pub fn stored_hash(candidate: &LoginCandidate) -> Result<&str, AppError> {
    candidate
        .password_hash
        .as_deref()
        .ok_or(AppError::CredentialMissing)
}

/// Insert the user's credential, replacing any existing one.
pub async fn upsert_credential(
    conn: &mut PgConnection,
    user_id: i64,
    password_hash: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO user_passwords (user_id, password_hash, password_algorithm)
        VALUES ($1, $2, 'bcrypt')
        ON CONFLICT (user_id)
        DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Hash on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password_blocking(plain: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
}

pub async fn verify_password_blocking(hash: Option<String>, plain: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&hash, &plain),
        None => Ok(verify_against_dummy(&plain)),
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
}
