use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    cancel::cancellable,
    errors::AppError,
    questions::{
        dto::{QuestionDto, QuestionListResponse},
        filter::{translation_languages, Ordering, QuestionFilter},
        params::QuestionListParams,
        repo, transformer,
    },
};

/// Count and page under one filter, read from the same snapshot so `total`
/// agrees with the rows returned.
#[instrument(skip(db, params, cancel), fields(page = params.page, page_size = params.page_size))]
pub async fn list_questions(
    db: &PgPool,
    params: &QuestionListParams,
    default_language: &str,
    cancel: &CancellationToken,
) -> Result<QuestionListResponse, AppError> {
    let filter = QuestionFilter::from_params(params);
    let ordering = Ordering::from_params(params);
    let languages = translation_languages(params, default_language);

    cancellable(cancel, async {
        let mut tx = db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let total = repo::count_questions(&mut *tx, &filter, &languages).await?;
        let rows = if total > params.offset() {
            repo::list_page(&mut *tx, &filter, ordering, params, &languages).await?
        } else {
            Vec::new()
        };
        tx.commit().await?;

        debug!(total, returned = rows.len(), "questions listed");
        Ok(QuestionListResponse {
            questions: rows.into_iter().map(transformer::to_simple_question).collect(),
            total,
        })
    })
    .await
}

/// Detailed view of one question for `viewer`.
#[instrument(skip(db, languages, cancel))]
pub async fn get_question(
    db: &PgPool,
    question_uuid: Uuid,
    languages: &[String],
    viewer: Option<Uuid>,
    default_language: &str,
    cancel: &CancellationToken,
) -> Result<QuestionDto, AppError> {
    let languages = if languages.is_empty() {
        vec![default_language.to_string()]
    } else {
        languages.to_vec()
    };

    cancellable(cancel, async {
        let mut conn = db.acquire().await?;
        let rows = repo::get_question(&mut *conn, question_uuid, &languages, viewer).await?;
        Ok(transformer::to_detail_question(rows))
    })
    .await
}
