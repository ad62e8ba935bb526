use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::{
    errors::AppError,
    questions::{
        filter::{push_source, push_translation_join, Ordering, QuestionFilter},
        params::QuestionListParams,
        repo_types::{DetailedQuestionRows, OptionRow, QuestionRow, SubmissionRow},
    },
};

const QUESTION_COLUMNS: &str = "q.id AS question_id, q.question_uuid, q.category, q.difficulty, \
     q.question_type, q.public, q.likes, q.submit_count, q.correct_count, q.published_at, \
     q.created_at, u.user_uuid AS creator_uuid, t.language, t.question_text, t.explanation";

/// `solved`: the viewer has at least one correct submission. Binds the viewer.
fn push_solved(qb: &mut QueryBuilder<'_, Postgres>, viewer: Option<Uuid>) {
    qb.push(
        ", EXISTS (SELECT 1 FROM question_submissions s JOIN users su ON su.id = s.user_id \
         WHERE s.question_id = q.id AND s.is_correct AND su.user_uuid = ",
    );
    qb.push_bind(viewer);
    qb.push(") AS solved");
}

/// Number of visible questions matching `filter`.
pub async fn count_questions(
    conn: &mut PgConnection,
    filter: &QuestionFilter,
    languages: &[String],
) -> Result<i64, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    push_source(&mut qb, filter, languages);
    let total = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
    Ok(total)
}

/// One page of visible questions matching `filter`, in `ordering`.
pub async fn list_page(
    conn: &mut PgConnection,
    filter: &QuestionFilter,
    ordering: Ordering,
    params: &QuestionListParams,
    languages: &[String],
) -> Result<Vec<QuestionRow>, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(QUESTION_COLUMNS);
    push_solved(&mut qb, params.viewer);
    push_source(&mut qb, filter, languages);
    ordering.push_order_by(&mut qb);
    qb.push(" LIMIT ");
    qb.push_bind(params.page_size);
    qb.push(" OFFSET ");
    qb.push_bind(params.offset());

    debug!(sql = qb.sql(), "list questions");
    let rows = qb
        .build_query_as::<QuestionRow>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Question by public id, visible or created by `viewer`, with the viewer's
/// latest submission and every option.
pub async fn get_question(
    conn: &mut PgConnection,
    question_uuid: Uuid,
    languages: &[String],
    viewer: Option<Uuid>,
) -> Result<DetailedQuestionRows, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(QUESTION_COLUMNS);
    push_solved(&mut qb, viewer);
    qb.push(" FROM questions q LEFT JOIN users u ON u.id = q.created_by");
    push_translation_join(&mut qb, languages);
    qb.push(" WHERE q.question_uuid = ");
    qb.push_bind(question_uuid);
    qb.push(" AND ((q.public AND q.is_published) OR u.user_uuid = ");
    qb.push_bind(viewer);
    qb.push(")");

    let question = qb
        .build_query_as::<QuestionRow>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "question",
            id: question_uuid.to_string(),
        })?;

    let submission = match viewer {
        Some(viewer) => latest_submission(conn, question.question_id, viewer).await?,
        None => None,
    };
    let options = list_options(conn, question.question_id, languages).await?;

    Ok(DetailedQuestionRows {
        question,
        submission,
        options,
    })
}

async fn latest_submission(
    conn: &mut PgConnection,
    question_id: i64,
    viewer: Uuid,
) -> Result<Option<SubmissionRow>, AppError> {
    let row = sqlx::query_as::<_, SubmissionRow>(
        r#"
        SELECT s.selected_option_ids
        FROM question_submissions s
        JOIN users u ON u.id = s.user_id
        WHERE s.question_id = $1 AND u.user_uuid = $2
        ORDER BY s.submitted_at DESC, s.id DESC
        LIMIT 1
        "#,
    )
    .bind(question_id)
    .bind(viewer)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

async fn list_options(
    conn: &mut PgConnection,
    question_id: i64,
    languages: &[String],
) -> Result<Vec<OptionRow>, AppError> {
    let rows = sqlx::query_as::<_, OptionRow>(
        r#"
        SELECT o.id, o.option_uuid, o.option_type, o.img_url, o.is_answer, ot.option_text
        FROM question_options o
        LEFT JOIN LATERAL (
            SELECT tr.option_text
            FROM option_translations tr
            WHERE tr.option_id = o.id AND tr.language = ANY($2)
            ORDER BY array_position($2, tr.language)
            LIMIT 1
        ) ot ON TRUE
        WHERE o.question_id = $1
        ORDER BY o.sort_order, o.id
        "#,
    )
    .bind(question_id)
    .bind(languages)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
