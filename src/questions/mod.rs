use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod filter;
pub mod handlers;
pub mod params;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod transformer;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::read_routes())
}
