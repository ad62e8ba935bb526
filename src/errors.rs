use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    /// Malformed request parameters or body
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Uniqueness violation, e.g. a second account for the same email
    #[error("{resource} already exists")]
    AlreadyExists { resource: &'static str },

    /// No password row exists for the user
    #[error("credential missing")]
    CredentialMissing,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn user_not_found(email: &str) -> Self {
        AppError::NotFound {
            resource: "user",
            id: email.to_string(),
        }
    }

    pub fn user_already_exists() -> Self {
        AppError::AlreadyExists { resource: "user" }
    }

    /// Stable machine-readable code, one per error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::AlreadyExists { .. } => "ALREADY_EXISTS",
            AppError::CredentialMissing | AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Cancelled => "CANCELLED",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyExists { .. } => StatusCode::CONFLICT,
            AppError::CredentialMissing | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients. Credential failures all read the same.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput { message } => message.clone(),
            AppError::NotFound { resource, .. } => format!("{resource} not found"),
            AppError::AlreadyExists { resource } => format!("{resource} already exists"),
            AppError::CredentialMissing | AppError::InvalidCredentials => {
                "Invalid email or password".to_string()
            }
            AppError::Cancelled => "Request cancelled".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!("internal error: {:#}", self);
            }
            AppError::CredentialMissing | AppError::InvalidCredentials => {
                tracing::info!("auth error: {}", self);
            }
            AppError::Cancelled => {
                tracing::warn!("request cancelled");
            }
            _ => {
                tracing::debug!("client error: {}", self);
            }
        }

        let body = ErrorBody {
            error: self.user_message(),
            code: self.code(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_indistinguishable() {
        let missing = AppError::CredentialMissing;
        let wrong = AppError::InvalidCredentials;
        assert_eq!(missing.code(), wrong.code());
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.status_code(), wrong.status_code());
        assert_eq!(missing.user_message(), wrong.user_message());
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.code(), "INTERNAL");
        assert!(!err.user_message().contains("10.0.0.3"));

        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn kinds_map_to_stable_codes() {
        assert_eq!(AppError::invalid_input("bad page").code(), "INVALID_INPUT");
        assert_eq!(AppError::user_not_found("a@b.c").code(), "NOT_FOUND");
        assert_eq!(AppError::user_already_exists().code(), "ALREADY_EXISTS");
        assert_eq!(
            AppError::user_already_exists().status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Cancelled.code(), "CANCELLED");
    }

    #[tokio::test]
    async fn response_body_is_structured_json() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
        assert_eq!(json["error"], "Invalid email or password");
    }
}
