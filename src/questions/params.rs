use std::str::FromStr;

use uuid::Uuid;

/// Ordered difficulty domain: easy < medium < hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Sort rank; stored values that are not a known difficulty rank 0.
    pub fn rank(&self) -> i32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    #[cfg(test)]
    pub fn rank_of(value: &str) -> i32 {
        value.parse::<Difficulty>().map(|d| d.rank()).unwrap_or(0)
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    PublishDate,
    Difficulty,
    Likes,
    Submissions,
    CorrectRate,
}

impl SortKey {
    /// Accepts `PublishDate`, `publish_date`, `publish-date`, `publishdate`
    /// and the same spellings of the other keys. Unknown or absent keys fall
    /// back to publish date.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return SortKey::default();
        };
        let key: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "publishdate" | "date" => SortKey::PublishDate,
            "difficulty" => SortKey::Difficulty,
            "likes" => SortKey::Likes,
            "submissions" => SortKey::Submissions,
            "correctrate" => SortKey::CorrectRate,
            _ => SortKey::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_desc_flag(desc: bool) -> Self {
        if desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// What a caller wants listed. Empty filters mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionListParams {
    pub page: i64,
    pub page_size: i64,
    pub category: Option<String>,
    pub difficulty: Vec<Difficulty>,
    pub query: Option<String>,
    pub sort_by: SortKey,
    pub sort: SortDirection,
    pub languages: Vec<String>,
    /// Public id of the caller, used for the `solved` flag.
    pub viewer: Option<Uuid>,
}

impl Default for QuestionListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 25,
            category: None,
            difficulty: Vec::new(),
            query: None,
            sort_by: SortKey::default(),
            sort: SortDirection::default(),
            languages: Vec::new(),
            viewer: None,
        }
    }
}

impl QuestionListParams {
    /// Rows skipped before the current page, never negative. Saturates
    /// instead of overflowing for absurd page numbers.
    pub fn offset(&self) -> i64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .max(0)
    }
}

/// Parses difficulty values, dropping the ones that are not recognised.
pub fn parse_difficulties<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<Difficulty> {
    let mut out: Vec<Difficulty> = values
        .into_iter()
        .filter_map(|v| v.parse().ok())
        .collect();
    out.sort();
    out.dedup();
    out
}
