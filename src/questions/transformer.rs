use crate::questions::{
    dto::{QuestionDto, QuestionOptionDto},
    repo_types::{DetailedQuestionRows, OptionRow, QuestionRow, SubmissionRow},
};

/// Listing view: no explanation, no options.
pub fn to_simple_question(row: QuestionRow) -> QuestionDto {
    QuestionDto {
        id: row.question_uuid,
        category: row.category,
        difficulty: row.difficulty,
        question_type: row.question_type,
        public: row.public,
        question_text: row.question_text.unwrap_or_default(),
        explanation: None,
        language: row.language,
        likes: row.likes,
        answer_count: row.submit_count,
        correct_count: row.correct_count,
        created_at: row.created_at,
        published_at: row.published_at,
        created_by: row.creator_uuid,
        solved: row.solved,
        options: None,
    }
}

pub fn to_detail_question(rows: DetailedQuestionRows) -> QuestionDto {
    let DetailedQuestionRows {
        mut question,
        submission,
        options,
    } = rows;
    let solved = question.solved;
    let explanation = question.explanation.take();

    let options = options
        .into_iter()
        .map(|o| to_option(o, submission.as_ref(), solved))
        .collect();

    QuestionDto {
        explanation,
        options: Some(options),
        ..to_simple_question(question)
    }
}

fn to_option(option: OptionRow, submission: Option<&SubmissionRow>, solved: bool) -> QuestionOptionDto {
    let selected = submission
        .map(|s| s.selected_option_ids.contains(&option.id))
        .unwrap_or(false);
    QuestionOptionDto {
        id: option.option_uuid,
        option_type: option.option_type,
        image: option.img_url,
        text: option.option_text,
        selected,
        is_answer: solved.then_some(option.is_answer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn question(solved: bool) -> QuestionRow {
        QuestionRow {
            question_id: 7,
            question_uuid: Uuid::new_v4(),
            category: "character".into(),
            difficulty: "hard".into(),
            question_type: "single_choice".into(),
            public: true,
            likes: 3,
            submit_count: 10,
            correct_count: 4,
            published_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            creator_uuid: None,
            language: Some("en".into()),
            question_text: Some("Who is the traveler's guide?".into()),
            explanation: Some("Paimon".into()),
            solved,
        }
    }

    fn option(id: i64, is_answer: bool) -> OptionRow {
        OptionRow {
            id,
            option_uuid: Uuid::new_v4(),
            option_type: "text".into(),
            img_url: None,
            is_answer,
            option_text: Some(format!("option {id}")),
        }
    }

    #[test]
    fn simple_question_hides_detail_fields() {
        let row = question(false);
        let uuid = row.question_uuid;
        let dto = to_simple_question(row);
        assert_eq!(dto.id, uuid);
        assert_eq!(dto.answer_count, 10);
        assert!(dto.explanation.is_none());
        assert!(dto.options.is_none());

        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("explanation").is_none());
        assert!(json.get("options").is_none());
        assert_eq!(json["questionText"], "Who is the traveler's guide?");
        assert!(json.get("question_id").is_none());
    }

    #[test]
    fn answers_stay_hidden_until_solved() {
        let submission = SubmissionRow {
            selected_option_ids: vec![2],
        };
        let dto = to_detail_question(DetailedQuestionRows {
            question: question(false),
            submission: Some(submission),
            options: vec![option(1, true), option(2, false)],
        });
        let options = dto.options.unwrap();
        assert_eq!(dto.explanation.as_deref(), Some("Paimon"));
        assert!(options.iter().all(|o| o.is_answer.is_none()));
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }

    #[test]
    fn solved_question_reveals_answers() {
        let dto = to_detail_question(DetailedQuestionRows {
            question: question(true),
            submission: None,
            options: vec![option(1, true), option(2, false)],
        });
        let options = dto.options.unwrap();
        assert_eq!(options[0].is_answer, Some(true));
        assert_eq!(options[1].is_answer, Some(false));
        assert!(options.iter().all(|o| !o.selected));
        let json = serde_json::to_value(&options[0]).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["isAnswer"], true);
    }
}
