use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{LoginLogRow, UserRow};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub uuid: Uuid,
    pub email: String,
    pub nickname: String,
    pub avatar_url: String,
    pub country: String,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    pub ip: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

/// Maps a stored user and its latest login onto the wire shape.
pub fn user_to_dto(user: &UserRow, login: Option<&LoginLogRow>) -> UserDto {
    UserDto {
        uuid: user.user_uuid,
        email: user.email.clone(),
        nickname: user.display_name.clone().unwrap_or_default(),
        avatar_url: user.avatar_url.clone().unwrap_or_default(),
        country: user.location.clone().unwrap_or_default(),
        registered_at: user.created_at,
        ip: login.map(|l| l.ip_address.clone()),
        last_login_at: login.map(|l| l.login_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRow {
        UserRow {
            id: 7,
            user_uuid: Uuid::new_v4(),
            email: "test@example.com".into(),
            display_name: Some("tester".into()),
            avatar_url: None,
            location: Some("SE".into()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn user_dto_serialization_hides_internal_id() {
        let user = user();
        let login = LoginLogRow {
            ip_address: "203.0.113.9".into(),
            login_at: OffsetDateTime::now_utc(),
        };
        let dto = user_to_dto(&user, Some(&login));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["email"], "test@example.com");
        assert_eq!(json["nickname"], "tester");
        assert_eq!(json["avatarUrl"], "");
        assert_eq!(json["country"], "SE");
        assert_eq!(json["ip"], "203.0.113.9");
        assert!(json.get("id").is_none());
        assert_eq!(json["uuid"], user.user_uuid.to_string());
    }

    #[test]
    fn user_dto_without_login() {
        let dto = user_to_dto(&user(), None);
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json["ip"].is_null());
        assert!(json["lastLoginAt"].is_null());
    }
}
