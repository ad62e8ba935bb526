use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::AppError;
use crate::questions::params::{parse_difficulties, QuestionListParams, SortDirection, SortKey};

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: Uuid,
    pub category: String,
    pub difficulty: String,
    pub question_type: String,
    pub public: bool,
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub language: Option<String>,
    pub likes: i64,
    pub answer_count: i64,
    pub correct_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    pub created_by: Option<Uuid>,
    pub solved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOptionDto>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOptionDto {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub option_type: String,
    pub image: Option<String>,
    pub text: Option<String>,
    pub selected: bool,
    /// Only revealed once the viewer has solved the question.
    pub is_answer: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionDto>,
    pub total: i64,
}

/// `GET /questions` query string. Multi-valued filters are comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuestionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionLanguageQuery {
    pub language: Option<String>,
}

pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl ListQuestionsQuery {
    pub fn into_params(self, viewer: Option<Uuid>) -> Result<QuestionListParams, AppError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::invalid_input("page must be at least 1"));
        }
        let page_size = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::invalid_input(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let difficulties = split_list(self.difficulty.as_deref());
        Ok(QuestionListParams {
            page,
            page_size,
            category: self.category,
            difficulty: parse_difficulties(difficulties.iter().map(String::as_str)),
            query: self.query,
            sort_by: SortKey::parse_or_default(self.sort_by.as_deref()),
            sort: SortDirection::from_desc_flag(self.sort_desc.unwrap_or(false)),
            languages: split_list(self.language.as_deref()),
            viewer,
        })
    }
}
