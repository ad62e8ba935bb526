use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One listed question with its selected translation.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub question_id: i64, // internal, joins only
    pub question_uuid: Uuid,
    pub category: String,
    pub difficulty: String,
    pub question_type: String,
    pub public: bool,
    pub likes: i64,
    pub submit_count: i64,
    pub correct_count: i64,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub creator_uuid: Option<Uuid>,
    pub language: Option<String>,
    pub question_text: Option<String>,
    pub explanation: Option<String>,
    pub solved: bool,
}

/// The viewer's latest attempt at a question.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub selected_option_ids: Vec<i64>,
}

/// An option joined with its translation in the selected language.
#[derive(Debug, Clone, FromRow)]
pub struct OptionRow {
    pub id: i64,
    pub option_uuid: Uuid,
    pub option_type: String,
    pub img_url: Option<String>,
    pub is_answer: bool,
    pub option_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetailedQuestionRows {
    pub question: QuestionRow,
    pub submission: Option<SubmissionRow>,
    pub options: Vec<OptionRow>,
}
