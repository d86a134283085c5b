#[cfg(test)]
mod tests {
    use time::macros::datetime;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::models::{Choice, Poll, Question, QuestionType, VoteEntry};
    use crate::validation::{
        check_coverage, ensure_open, validate_answer, validate_poll_dates, ValidationError,
    };

    fn question(question_type: QuestionType, choice_count: usize) -> Question {
        let id = Uuid::new_v4();
        let choices = (0..choice_count)
            .map(|i| Choice {
                id: Uuid::new_v4(),
                question: id,
                choice_text: format!("choice {}", i),
            })
            .collect();
        Question {
            id,
            poll: Uuid::new_v4(),
            question_text: "prompt".into(),
            question_type,
            choices,
        }
    }

    fn entry(question: &Question, choices: &[Uuid], answer: Option<&str>) -> VoteEntry {
        VoteEntry {
            question: question.id,
            choices: choices.to_vec(),
            answer: answer.map(String::from),
        }
    }

    fn poll(start: OffsetDateTime, end: OffsetDateTime) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            title: "poll".into(),
            description: None,
            start_date: start,
            end_date: end,
            questions: Vec::new(),
        }
    }

    #[test]
    fn text_answer_accepts_non_empty_text() {
        let q = question(QuestionType::TextAnswer, 0);
        assert!(validate_answer(&q, &entry(&q, &[], Some("ok"))).is_ok());
    }

    #[test]
    fn text_answer_rejects_empty_or_missing_text() {
        let q = question(QuestionType::TextAnswer, 0);
        assert_eq!(
            validate_answer(&q, &entry(&q, &[], Some(""))),
            Err(ValidationError::NeedsTextAnswer)
        );
        assert_eq!(
            validate_answer(&q, &entry(&q, &[], None)),
            Err(ValidationError::NeedsTextAnswer)
        );
    }

    #[test]
    fn text_answer_rejects_any_selected_choice() {
        let q = question(QuestionType::TextAnswer, 0);
        assert_eq!(
            validate_answer(&q, &entry(&q, &[Uuid::new_v4()], Some("ok"))),
            Err(ValidationError::NeedsTextAnswer)
        );
    }

    #[test]
    fn single_choice_accepts_exactly_one_own_choice() {
        let q = question(QuestionType::SingleChoice, 2);
        let picked = [q.choices[0].id];
        assert!(validate_answer(&q, &entry(&q, &picked, None)).is_ok());
    }

    #[test]
    fn single_choice_rejects_more_than_one() {
        let q = question(QuestionType::SingleChoice, 2);
        let picked = [q.choices[0].id, q.choices[1].id];
        assert_eq!(
            validate_answer(&q, &entry(&q, &picked, None)),
            Err(ValidationError::TooManyChoices)
        );
    }

    #[test]
    fn choice_question_with_defined_choices_rejects_empty_selection() {
        let single = question(QuestionType::SingleChoice, 2);
        let multi = question(QuestionType::MultipleChoice, 3);
        assert_eq!(
            validate_answer(&single, &entry(&single, &[], None)),
            Err(ValidationError::ChoiceRequired)
        );
        assert_eq!(
            validate_answer(&multi, &entry(&multi, &[], None)),
            Err(ValidationError::ChoiceRequired)
        );
    }

    #[test]
    fn choice_question_without_defined_choices_accepts_empty_selection() {
        let q = question(QuestionType::SingleChoice, 0);
        assert!(validate_answer(&q, &entry(&q, &[], None)).is_ok());
    }

    #[test]
    fn multiple_choice_accepts_several_own_choices() {
        let q = question(QuestionType::MultipleChoice, 3);
        let picked = [q.choices[0].id, q.choices[2].id];
        assert!(validate_answer(&q, &entry(&q, &picked, None)).is_ok());
    }

    #[test]
    fn foreign_choice_is_rejected_for_any_choice_type() {
        let other = question(QuestionType::SingleChoice, 2);
        for question_type in [QuestionType::SingleChoice, QuestionType::MultipleChoice] {
            let q = question(question_type, 2);
            let picked = [other.choices[0].id];
            assert_eq!(
                validate_answer(&q, &entry(&q, &picked, None)),
                Err(ValidationError::ChoiceNotInQuestion)
            );
        }
    }

    #[test]
    fn choice_rules_run_in_order() {
        // Two foreign choices on a single-choice question: the count rule
        // fires before the ownership rule.
        let q = question(QuestionType::SingleChoice, 1);
        let picked = [Uuid::new_v4(), Uuid::new_v4()];
        assert_eq!(
            validate_answer(&q, &entry(&q, &picked, None)),
            Err(ValidationError::TooManyChoices)
        );
    }

    #[test]
    fn coverage_accepts_exact_question_set() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut submitted = ids.clone();
        submitted.reverse();
        assert!(check_coverage(&ids, &submitted).is_ok());
    }

    #[test]
    fn coverage_rejects_missing_questions() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        assert_eq!(
            check_coverage(&ids, &ids[..2]),
            Err(ValidationError::IncompleteCoverage)
        );
    }

    #[test]
    fn coverage_rejects_foreign_question_ids() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let mut submitted = ids.clone();
        submitted.push(Uuid::new_v4());
        assert_eq!(
            check_coverage(&ids, &submitted),
            Err(ValidationError::QuestionsNotInPoll)
        );
    }

    #[test]
    fn coverage_rejects_overlapping_but_mismatched_ids() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let submitted = vec![ids[0], ids[1], Uuid::new_v4()];
        assert_eq!(
            check_coverage(&ids, &submitted),
            Err(ValidationError::QuestionsNotInPoll)
        );
    }

    #[test]
    fn coverage_rejects_duplicate_question_ids() {
        let ids: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let submitted = vec![ids[0], ids[0], ids[1]];
        assert_eq!(
            check_coverage(&ids, &submitted),
            Err(ValidationError::QuestionsNotInPoll)
        );
    }

    #[test]
    fn coverage_rejects_empty_submission_for_non_empty_poll() {
        let ids = vec![Uuid::new_v4()];
        assert_eq!(
            check_coverage(&ids, &[]),
            Err(ValidationError::IncompleteCoverage)
        );
    }

    #[test]
    fn voting_window_is_strict_at_both_boundaries() {
        let start = datetime!(2024-01-01 10:00 UTC);
        let end = datetime!(2024-01-01 11:00 UTC);
        let p = poll(start, end);
        assert!(!p.is_open(start));
        assert!(!p.is_open(end));
        assert!(p.is_open(datetime!(2024-01-01 10:30 UTC)));
        assert!(!p.is_open(datetime!(2024-01-01 09:59 UTC)));
        assert!(!p.is_open(datetime!(2024-01-01 11:01 UTC)));
    }

    #[test]
    fn active_listing_is_inclusive_at_both_boundaries() {
        let start = datetime!(2024-01-01 10:00 UTC);
        let end = datetime!(2024-01-01 11:00 UTC);
        let p = poll(start, end);
        assert!(p.is_active(start));
        assert!(p.is_active(end));
        assert!(!p.is_active(datetime!(2024-01-01 09:59:59 UTC)));
        assert!(!p.is_active(datetime!(2024-01-01 11:00:01 UTC)));
    }

    #[test]
    fn boundary_asymmetry_at_end_instant() {
        // At exactly the end date the poll still lists as active but a
        // submission is rejected with the window error.
        let start = datetime!(2024-01-01 10:00 UTC);
        let end = datetime!(2024-01-01 11:00 UTC);
        let p = poll(start, end);
        assert!(p.is_active(end));
        assert_eq!(
            ensure_open(&p, end),
            Err(ValidationError::PollClosed { start, end })
        );
    }

    #[test]
    fn window_error_reports_configured_bounds() {
        let start = datetime!(2024-01-01 10:00 UTC);
        let end = datetime!(2024-01-01 11:00 UTC);
        let p = poll(start, end);
        let err = ensure_open(&p, datetime!(2024-01-02 00:00 UTC)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ended or not started"));
    }

    #[test]
    fn poll_dates_reject_end_before_start() {
        let start = datetime!(2024-01-02 00:00 UTC);
        let end = datetime!(2024-01-01 00:00 UTC);
        assert_eq!(
            validate_poll_dates(start, end),
            Err(ValidationError::EndBeforeStart)
        );
    }

    #[test]
    fn poll_dates_accept_equal_and_ordered_bounds() {
        let start = datetime!(2024-01-01 00:00 UTC);
        assert!(validate_poll_dates(start, start).is_ok());
        assert!(validate_poll_dates(start, datetime!(2024-01-02 00:00 UTC)).is_ok());
    }

    #[test]
    fn error_fields_are_scoped_where_natural() {
        assert_eq!(ValidationError::TooManyChoices.field(), Some("choices"));
        assert_eq!(ValidationError::ChoiceNotInQuestion.field(), Some("choices"));
        assert_eq!(ValidationError::EndBeforeStart.field(), Some("endDate"));
        assert_eq!(ValidationError::NeedsTextAnswer.field(), None);
        assert_eq!(ValidationError::AlreadyParticipated.field(), None);
    }

    #[test]
    fn question_type_uses_upper_snake_wire_tags() {
        assert_eq!(
            serde_json::to_string(&QuestionType::TextAnswer).unwrap(),
            "\"TEXT_ANSWER\""
        );
        assert_eq!(
            serde_json::to_string(&QuestionType::SingleChoice).unwrap(),
            "\"SINGLE_CHOICE\""
        );
        assert_eq!(
            serde_json::to_string(&QuestionType::MultipleChoice).unwrap(),
            "\"MULTIPLE_CHOICE\""
        );
    }

    #[test]
    fn vote_entry_defaults_optional_fields() {
        let q = Uuid::new_v4();
        let entry: VoteEntry =
            serde_json::from_str(&format!("{{\"question\":\"{}\"}}", q)).unwrap();
        assert_eq!(entry.question, q);
        assert!(entry.choices.is_empty());
        assert!(entry.answer.is_none());
    }
}
