use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest, UserDto},
        jwt::{AuthUser, JwtKeys},
        services,
    },
    errors::AppError,
    extract,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Caller address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_default()
}

#[instrument(skip(state, headers, payload))]
pub async fn register(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    extract::Json(payload): extract::Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let keys = JwtKeys::from_ref(&state);
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let session = services::register_user(
        &state.db,
        &keys,
        &payload.email,
        &payload.password,
        &ip,
        &state.request_token(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: session.token,
            user: session.user,
        }),
    ))
}

#[instrument(skip(state, headers, payload))]
pub async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    extract::Json(payload): extract::Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let session = services::login_user(
        &state.db,
        &keys,
        &payload.email,
        &payload.password,
        &ip,
        &state.request_token(),
    )
    .await?;

    Ok(Json(AuthResponse {
        token: session.token,
        user: session.user,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserDto>, AppError> {
    let me = services::current_user(&state.db, user.user_id, &state.request_token()).await?;
    Ok(Json(me))
}
