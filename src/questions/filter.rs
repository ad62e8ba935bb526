//! SQL building blocks for question listings.
//!
//! The filter is a list of typed clauses folded with `AND`. Both the count
//! query and the page query push the same [`QuestionFilter`] through
//! [`push_source`], so the two can never disagree about which rows match.

use sqlx::{Postgres, QueryBuilder};

use crate::questions::params::{Difficulty, QuestionListParams, SortDirection, SortKey};

/// One conjunct of the listing predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `public AND is_published`, always present.
    Visible,
    Category(String),
    /// One value compares with `=`, several with `= ANY(..)`.
    Difficulty(Vec<Difficulty>),
    /// The selected translation must be in one of these languages.
    Language(Vec<String>),
    /// Lower-cased `LIKE` pattern, already wrapped in `%`.
    TextSearch(String),
}

impl Clause {
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Clause::Visible => {
                qb.push("(q.public AND q.is_published)");
            }
            Clause::Category(category) => {
                qb.push("q.category = ");
                qb.push_bind(category.clone());
            }
            Clause::Difficulty(values) => match values.as_slice() {
                [single] => {
                    qb.push("q.difficulty = ");
                    qb.push_bind(single.as_str());
                }
                many => {
                    let names: Vec<String> = many.iter().map(|d| d.as_str().to_string()).collect();
                    qb.push("q.difficulty = ANY(");
                    qb.push_bind(names);
                    qb.push(")");
                }
            },
            Clause::Language(languages) => {
                qb.push("t.language = ANY(");
                qb.push_bind(languages.clone());
                qb.push(")");
            }
            Clause::TextSearch(pattern) => {
                qb.push("LOWER(t.question_text) LIKE ");
                qb.push_bind(pattern.clone());
            }
        }
    }
}

/// Ordered conjunction of [`Clause`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFilter {
    clauses: Vec<Clause>,
}

impl QuestionFilter {
    /// Never fails: blank or unrecognised values add no constraint.
    pub fn from_params(params: &QuestionListParams) -> Self {
        let mut clauses = vec![Clause::Visible];

        if let Some(category) = non_blank(params.category.as_deref()) {
            clauses.push(Clause::Category(category.to_string()));
        }
        if !params.difficulty.is_empty() {
            clauses.push(Clause::Difficulty(params.difficulty.clone()));
        }
        let languages: Vec<String> = params
            .languages
            .iter()
            .filter_map(|l| non_blank(Some(l)))
            .map(str::to_string)
            .collect();
        if !languages.is_empty() {
            clauses.push(Clause::Language(languages));
        }
        if let Some(query) = non_blank(params.query.as_deref()) {
            clauses.push(Clause::TextSearch(like_pattern(query)));
        }

        Self { clauses }
    }

    #[cfg(test)]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE ");
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                qb.push(" AND ");
            }
            clause.push_to(qb);
        }
    }
}

/// Sort expression plus direction; ties break on the internal id in the
/// same direction so paging is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Ordering {
    pub fn from_params(params: &QuestionListParams) -> Self {
        Self {
            key: params.sort_by,
            direction: params.sort,
        }
    }

    pub fn expression(&self) -> String {
        match self.key {
            SortKey::PublishDate => "COALESCE(q.published_at, q.created_at)".to_string(),
            SortKey::Difficulty => difficulty_rank_sql(),
            SortKey::Likes => "q.likes".to_string(),
            SortKey::Submissions => "q.submit_count".to_string(),
            SortKey::CorrectRate => {
                "COALESCE(q.correct_count::float8 / NULLIF(q.submit_count, 0), 0)".to_string()
            }
        }
    }

    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let dir = self.direction.as_sql();
        qb.push(" ORDER BY ");
        qb.push(self.expression());
        qb.push(" ");
        qb.push(dir);
        qb.push(", q.id ");
        qb.push(dir);
    }
}

/// `CASE` mapping each stored difficulty to [`Difficulty::rank`].
fn difficulty_rank_sql() -> String {
    let mut sql = String::from("CASE q.difficulty");
    for difficulty in Difficulty::ALL {
        sql.push_str(&format!(" WHEN '{}' THEN {}", difficulty.as_str(), difficulty.rank()));
    }
    sql.push_str(" ELSE 0 END");
    sql
}

/// Languages to pick a translation from, in preference order.
pub fn translation_languages(params: &QuestionListParams, default_language: &str) -> Vec<String> {
    let requested: Vec<String> = params
        .languages
        .iter()
        .filter_map(|l| non_blank(Some(l)))
        .map(str::to_string)
        .collect();
    if requested.is_empty() {
        vec![default_language.to_string()]
    } else {
        requested
    }
}

/// At most one translation row per question: the first language of
/// `languages` the question has. `t.*` is NULL when none matches.
pub fn push_translation_join(qb: &mut QueryBuilder<'_, Postgres>, languages: &[String]) {
    qb.push(
        " LEFT JOIN LATERAL (\
         SELECT tr.language, tr.question_text, tr.explanation \
         FROM question_translations tr \
         WHERE tr.question_id = q.id AND tr.language = ANY(",
    );
    qb.push_bind(languages.to_vec());
    qb.push(") ORDER BY array_position(");
    qb.push_bind(languages.to_vec());
    qb.push(", tr.language) LIMIT 1) t ON TRUE");
}

/// `FROM .. JOIN .. WHERE ..` shared by the count and the page query.
pub fn push_source(qb: &mut QueryBuilder<'_, Postgres>, filter: &QuestionFilter, languages: &[String]) {
    qb.push(" FROM questions q LEFT JOIN users u ON u.id = q.created_by");
    push_translation_join(qb, languages);
    filter.push_where(qb);
}

/// Case-insensitive substring pattern; `%`, `_` and `\` in the term match
/// literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
