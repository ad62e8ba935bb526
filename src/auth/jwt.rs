use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{auth::claims::Claims, errors::AppError, state::AppState};

/// Session tokens expire exactly this long after issuance.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// HS256 signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TOKEN_TTL,
        }
    }

    pub fn sign(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(e.into()))?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from_secret(&state.config.jwt.secret)
    }
}

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
pub struct AuthUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .ok_or(AppError::InvalidCredentials)?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::InvalidCredentials
        })?;

        Ok(AuthUser {
            user_id: claims.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = JwtKeys::from_secret("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "alice@example.com").expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn expiry_is_exactly_one_day() {
        let keys = JwtKeys::from_secret("dev-secret");
        let token = keys.sign(Uuid::new_v4(), "a@b.io").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = JwtKeys::from_secret("same-secret");
        let bad = JwtKeys::from_secret("other-secret");
        let token = good.sign(Uuid::new_v4(), "a@b.io").unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn header_uses_hs256() {
        let keys = JwtKeys::from_secret("dev-secret");
        let token = keys.sign(Uuid::new_v4(), "a@b.io").unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[tokio::test]
    async fn extractor_accepts_bearer_token() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "bob@example.com").unwrap();

        let (mut parts, _) = Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[tokio::test]
    async fn extractor_rejects_missing_or_garbage_token() {
        let state = AppState::fake();

        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert!(matches!(err, AppError::InvalidCredentials));

        let (mut parts, _) = Request::builder()
            .header("Authorization", "Bearer not.a.jwt")
            .body(())
            .unwrap()
            .into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
