use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    errors::AppError,
    extract::{Path, Query},
    questions::{
        dto::{split_list, ListQuestionsQuery, QuestionDto, QuestionLanguageQuery, QuestionListResponse},
        services,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/questions/:id", get(get_question))
}

#[instrument(skip(state, user, query), fields(user_id = %user.user_id))]
pub async fn list_questions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<QuestionListResponse>, AppError> {
    let params = query.into_params(Some(user.user_id))?;
    let list = services::list_questions(
        &state.db,
        &params,
        &state.config.default_language,
        &state.request_token(),
    )
    .await?;
    Ok(Json(list))
}

#[instrument(skip(state, user, query), fields(user_id = %user.user_id))]
pub async fn get_question(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<QuestionLanguageQuery>,
) -> Result<Json<QuestionDto>, AppError> {
    let languages = split_list(query.language.as_deref());
    let question = services::get_question(
        &state.db,
        id,
        &languages,
        Some(user.user_id),
        &state.config.default_language,
        &state.request_token(),
    )
    .await?;
    Ok(Json(question))
}
