use time::OffsetDateTime;
use uuid::Uuid;
use std::collections::HashSet;

use crate::models::{Poll, Question, QuestionType, VoteEntry};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Question needs text answer!")]
    NeedsTextAnswer,
    #[error("Please, choose something!")]
    ChoiceRequired,
    #[error("Only one choice!")]
    TooManyChoices,
    #[error("Choice not in question!")]
    ChoiceNotInQuestion,
    #[error("User already participated in this poll!")]
    AlreadyParticipated,
    #[error("Poll time is ended or not started {start} - {end}")]
    PollClosed {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },
    #[error("Probably some questions not in poll")]
    QuestionsNotInPoll,
    #[error("Please answer all questions!")]
    IncompleteCoverage,
    #[error("End date must be after start date!")]
    EndBeforeStart,
}

impl ValidationError {
    /// Field the error naturally belongs to, for client-side display.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::TooManyChoices | ValidationError::ChoiceNotInQuestion => {
                Some("choices")
            }
            ValidationError::EndBeforeStart => Some("endDate"),
            _ => None,
        }
    }
}

/// Checks that one proposed answer has the right shape for its question,
/// independent of poll-wide concerns. Rules run in order; the first
/// violation is reported.
pub fn validate_answer(question: &Question, entry: &VoteEntry) -> Result<(), ValidationError> {
    match question.question_type {
        QuestionType::TextAnswer => {
            let answer = entry.answer.as_deref().unwrap_or("");
            if !entry.choices.is_empty() || answer.is_empty() {
                return Err(ValidationError::NeedsTextAnswer);
            }
        }
        question_type => {
            if !question.choices.is_empty() && entry.choices.is_empty() {
                return Err(ValidationError::ChoiceRequired);
            }
            if question_type == QuestionType::SingleChoice && entry.choices.len() > 1 {
                return Err(ValidationError::TooManyChoices);
            }
            for choice_id in &entry.choices {
                if !question.choices.iter().any(|c| c.id == *choice_id) {
                    return Err(ValidationError::ChoiceNotInQuestion);
                }
            }
        }
    }
    Ok(())
}

/// Checks that a submission covers exactly the poll's question set. The
/// distinct submitted ids belonging to the poll must match the raw submitted
/// count (this also rejects duplicate ids) and the poll's question count.
pub fn check_coverage(poll_question_ids: &[Uuid], submitted: &[Uuid]) -> Result<(), ValidationError> {
    let belonging: HashSet<Uuid> = submitted
        .iter()
        .copied()
        .filter(|id| poll_question_ids.contains(id))
        .collect();
    if belonging.len() != submitted.len() {
        return Err(ValidationError::QuestionsNotInPoll);
    }
    if belonging.len() != poll_question_ids.len() {
        return Err(ValidationError::IncompleteCoverage);
    }
    Ok(())
}

/// Voting-window check, strict at both boundary instants.
pub fn ensure_open(poll: &Poll, now: OffsetDateTime) -> Result<(), ValidationError> {
    if !poll.is_open(now) {
        return Err(ValidationError::PollClosed {
            start: poll.start_date,
            end: poll.end_date,
        });
    }
    Ok(())
}

/// Poll date invariant, checked on create and edit. Equal dates are allowed.
pub fn validate_poll_dates(
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}
