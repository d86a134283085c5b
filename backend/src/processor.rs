use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::queries::Queries;
use shared::models::{QuestionType, VoteEntry};
use shared::validation::{self, ValidationError};

pub struct VoteProcessor;

impl VoteProcessor {
    /// Validates and persists one complete response to one poll. `now` is
    /// supplied by the caller; the coordinator holds no clock of its own.
    ///
    /// Every check and every write runs inside a single transaction, and the
    /// poll row is locked up front, so two concurrent submissions from the
    /// same user cannot both pass the participation check and both commit.
    /// Nothing is observable until the commit; any failure rolls the whole
    /// response back.
    pub async fn submit_poll_response(
        pool: &PgPool,
        poll_id: Uuid,
        user: Option<Uuid>,
        now: OffsetDateTime,
        votes: &[VoteEntry],
    ) -> Result<Uuid, ApiError> {
        let mut tx = pool.begin().await?;

        // Serializes submissions to the same poll: at READ COMMITTED the
        // participation count below could otherwise race a concurrent insert.
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM polls WHERE id = $1 FOR UPDATE")
                .bind(poll_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(ApiError::NotFound);
        }

        let poll = Queries::fetch_poll(&mut tx, poll_id)
            .await?
            .ok_or(ApiError::NotFound)?;

        if let Some(user_id) = user {
            if Queries::user_participated(&mut tx, poll.id, user_id).await? {
                return Err(ValidationError::AlreadyParticipated.into());
            }
        }

        validation::ensure_open(&poll, now)?;

        let submitted: Vec<Uuid> = votes.iter().map(|entry| entry.question).collect();
        validation::check_coverage(&poll.question_ids(), &submitted)?;

        for entry in votes {
            let question = poll
                .questions
                .iter()
                .find(|q| q.id == entry.question)
                .ok_or(ValidationError::QuestionsNotInPoll)?;
            if let Err(e) = validation::validate_answer(question, entry) {
                debug!("answer rejected: question={} error={}", question.id, e);
                return Err(e.into());
            }
        }

        for entry in votes {
            let question = poll
                .questions
                .iter()
                .find(|q| q.id == entry.question)
                .ok_or(ValidationError::QuestionsNotInPoll)?;

            let vote_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO votes (id, question_id, user_id, answer) VALUES ($1, $2, $3, $4)",
            )
            .bind(vote_id)
            .bind(question.id)
            .bind(user)
            .bind(&entry.answer)
            .execute(&mut *tx)
            .await
            .map_err(map_vote_insert_error)?;

            if question.question_type != QuestionType::TextAnswer {
                for choice_id in &entry.choices {
                    sqlx::query("INSERT INTO vote_choices (vote_id, choice_id) VALUES ($1, $2)")
                        .bind(vote_id)
                        .bind(choice_id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        info!(
            "recorded poll response: poll={} answers={} anonymous={}",
            poll.id,
            votes.len(),
            user.is_none()
        );
        Ok(poll.id)
    }
}

/// The `votes_question_user_unique` index is the store-side backstop against
/// a double response landing despite the poll-row lock.
pub(crate) fn map_vote_insert_error(e: sqlx::Error) -> ApiError {
    if e.to_string().contains("votes_question_user_unique") {
        ValidationError::AlreadyParticipated.into()
    } else {
        e.into()
    }
}
