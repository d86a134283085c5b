use sqlx::{FromRow, PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use shared::models::*;
use shared::validation::{self, ValidationError};

#[derive(FromRow)]
struct PollRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    start_date: OffsetDateTime,
    end_date: OffsetDateTime,
}

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    poll_id: Uuid,
    question_text: String,
    question_type: QuestionType,
}

#[derive(FromRow)]
pub(crate) struct ChoiceRow {
    pub(crate) id: Uuid,
    pub(crate) question_id: Uuid,
    pub(crate) choice_text: String,
}

#[derive(FromRow)]
struct VoteRow {
    id: Uuid,
    question_id: Uuid,
    user_id: Option<Uuid>,
    answer: Option<String>,
}

impl ChoiceRow {
    pub(crate) fn into_choice(self) -> Choice {
        Choice {
            id: self.id,
            question: self.question_id,
            choice_text: self.choice_text,
        }
    }
}

/// Splits nested choice payloads into text renames of existing choices and
/// brand-new choices. Ownership of the named ids is checked at update time.
pub fn split_choice_inputs(inputs: &[ChoiceInput]) -> (Vec<(Uuid, String)>, Vec<String>) {
    let mut renames = Vec::new();
    let mut creations = Vec::new();
    for input in inputs {
        match input.id {
            Some(id) => renames.push((id, input.choice_text.clone())),
            None => creations.push(input.choice_text.clone()),
        }
    }
    (renames, creations)
}

pub struct Queries;

impl Queries {
    async fn load_choices(conn: &mut PgConnection, question_id: Uuid) -> Result<Vec<Choice>, ApiError> {
        let rows = sqlx::query_as::<_, ChoiceRow>(
            "SELECT id, question_id, choice_text FROM choices WHERE question_id = $1 ORDER BY choice_text",
        )
        .bind(question_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(ChoiceRow::into_choice).collect())
    }

    async fn load_questions(conn: &mut PgConnection, poll_id: Uuid) -> Result<Vec<Question>, ApiError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, poll_id, question_text, question_type FROM questions WHERE poll_id = $1 ORDER BY question_text",
        )
        .bind(poll_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            let choices = Self::load_choices(&mut *conn, row.id).await?;
            questions.push(Question {
                id: row.id,
                poll: row.poll_id,
                question_text: row.question_text,
                question_type: row.question_type,
                choices,
            });
        }
        Ok(questions)
    }

    async fn assemble_poll(conn: &mut PgConnection, row: PollRow) -> Result<Poll, ApiError> {
        let questions = Self::load_questions(&mut *conn, row.id).await?;
        Ok(Poll {
            id: row.id,
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            questions,
        })
    }

    pub async fn fetch_poll(conn: &mut PgConnection, id: Uuid) -> Result<Option<Poll>, ApiError> {
        let record = sqlx::query_as::<_, PollRow>(
            "SELECT id, title, description, start_date, end_date FROM polls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = record else { return Ok(None) };
        Ok(Some(Self::assemble_poll(conn, row).await?))
    }

    pub async fn list_polls(conn: &mut PgConnection) -> Result<Vec<Poll>, ApiError> {
        let rows = sqlx::query_as::<_, PollRow>(
            "SELECT id, title, description, start_date, end_date FROM polls ORDER BY start_date DESC",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut polls = Vec::with_capacity(rows.len());
        for row in rows {
            polls.push(Self::assemble_poll(&mut *conn, row).await?);
        }
        Ok(polls)
    }

    /// Polls listed as active use inclusive bounds, looser than the strict
    /// window the submission pipeline enforces.
    pub async fn list_active_polls(
        conn: &mut PgConnection,
        now: OffsetDateTime,
    ) -> Result<Vec<Poll>, ApiError> {
        let rows = sqlx::query_as::<_, PollRow>(
            "SELECT id, title, description, start_date, end_date
             FROM polls
             WHERE start_date <= $1 AND end_date >= $1
             ORDER BY start_date DESC",
        )
        .bind(now)
        .fetch_all(&mut *conn)
        .await?;

        let mut polls = Vec::with_capacity(rows.len());
        for row in rows {
            polls.push(Self::assemble_poll(&mut *conn, row).await?);
        }
        Ok(polls)
    }

    pub async fn create_poll(pool: &PgPool, request: &CreatePollRequest) -> Result<Poll, ApiError> {
        validation::validate_poll_dates(request.start_date, request.end_date)?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO polls (id, title, description, start_date, end_date)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.start_date)
        .bind(request.end_date)
        .execute(pool)
        .await?;

        Ok(Poll {
            id,
            title: request.title.clone(),
            description: request.description.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            questions: Vec::new(),
        })
    }

    /// The start date is immutable once the poll exists; the new end date is
    /// validated against the stored start.
    pub async fn update_poll(
        pool: &PgPool,
        id: Uuid,
        request: &UpdatePollRequest,
    ) -> Result<Poll, ApiError> {
        let mut tx = pool.begin().await?;

        let start: Option<(OffsetDateTime,)> =
            sqlx::query_as("SELECT start_date FROM polls WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (start_date,) = start.ok_or(ApiError::NotFound)?;
        validation::validate_poll_dates(start_date, request.end_date)?;

        sqlx::query("UPDATE polls SET title = $1, description = $2, end_date = $3 WHERE id = $4")
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.end_date)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let poll = Self::fetch_poll(&mut tx, id).await?.ok_or(ApiError::NotFound)?;
        tx.commit().await?;
        Ok(poll)
    }

    pub async fn delete_poll(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    pub async fn fetch_question(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Question>, ApiError> {
        let record = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, poll_id, question_text, question_type FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = record else { return Ok(None) };
        let choices = Self::load_choices(conn, row.id).await?;
        Ok(Some(Question {
            id: row.id,
            poll: row.poll_id,
            question_text: row.question_text,
            question_type: row.question_type,
            choices,
        }))
    }

    /// Creates a question and its nested choices in one transaction.
    pub async fn create_question(
        pool: &PgPool,
        request: &CreateQuestionRequest,
    ) -> Result<Question, ApiError> {
        let mut tx = pool.begin().await?;

        let poll_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM polls WHERE id = $1")
            .bind(request.poll)
            .fetch_optional(&mut *tx)
            .await?;
        if poll_exists.is_none() {
            return Err(ApiError::NotFound);
        }

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO questions (id, poll_id, question_text, question_type)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(request.poll)
        .bind(&request.question_text)
        .bind(request.question_type)
        .execute(&mut *tx)
        .await?;

        let mut choices = Vec::with_capacity(request.choices.len());
        for choice in &request.choices {
            let choice_id = Uuid::new_v4();
            sqlx::query("INSERT INTO choices (id, question_id, choice_text) VALUES ($1, $2, $3)")
                .bind(choice_id)
                .bind(id)
                .bind(&choice.choice_text)
                .execute(&mut *tx)
                .await?;
            choices.push(Choice {
                id: choice_id,
                question: id,
                choice_text: choice.choice_text.clone(),
            });
        }

        tx.commit().await?;
        Ok(Question {
            id,
            poll: request.poll,
            question_text: request.question_text.clone(),
            question_type: request.question_type,
            choices,
        })
    }

    /// Updates a question and its nested choices atomically. Inputs carrying
    /// an id rename that choice and must name one owned by this question;
    /// inputs without an id create new choices.
    pub async fn update_question(
        pool: &PgPool,
        id: Uuid,
        request: &UpdateQuestionRequest,
    ) -> Result<Question, ApiError> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("UPDATE questions SET question_text = $1, question_type = $2 WHERE id = $3")
            .bind(&request.question_text)
            .bind(request.question_type)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        let (renames, creations) = split_choice_inputs(&request.choices);
        for (choice_id, text) in renames {
            let updated =
                sqlx::query("UPDATE choices SET choice_text = $1 WHERE id = $2 AND question_id = $3")
                    .bind(&text)
                    .bind(choice_id)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            if updated.rows_affected() == 0 {
                return Err(ValidationError::ChoiceNotInQuestion.into());
            }
        }
        for text in creations {
            sqlx::query("INSERT INTO choices (id, question_id, choice_text) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(id)
                .bind(&text)
                .execute(&mut *tx)
                .await?;
        }

        let question = Self::fetch_question(&mut tx, id).await?.ok_or(ApiError::NotFound)?;
        tx.commit().await?;
        Ok(question)
    }

    pub async fn delete_question(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    pub async fn fetch_choice(conn: &mut PgConnection, id: Uuid) -> Result<Option<Choice>, ApiError> {
        let record = sqlx::query_as::<_, ChoiceRow>(
            "SELECT id, question_id, choice_text FROM choices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(record.map(ChoiceRow::into_choice))
    }

    pub async fn create_choice(
        pool: &PgPool,
        request: &CreateChoiceRequest,
    ) -> Result<Choice, ApiError> {
        let question_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM questions WHERE id = $1")
                .bind(request.question)
                .fetch_optional(pool)
                .await?;
        if question_exists.is_none() {
            return Err(ApiError::NotFound);
        }

        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO choices (id, question_id, choice_text) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(request.question)
            .bind(&request.choice_text)
            .execute(pool)
            .await?;
        Ok(Choice {
            id,
            question: request.question,
            choice_text: request.choice_text.clone(),
        })
    }

    pub async fn update_choice(
        pool: &PgPool,
        id: Uuid,
        request: &UpdateChoiceRequest,
    ) -> Result<Choice, ApiError> {
        let updated = sqlx::query_as::<_, ChoiceRow>(
            "UPDATE choices SET choice_text = $1 WHERE id = $2
             RETURNING id, question_id, choice_text",
        )
        .bind(&request.choice_text)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        updated.map(ChoiceRow::into_choice).ok_or(ApiError::NotFound)
    }

    pub async fn delete_choice(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM choices WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    pub async fn user_exists(conn: &mut PgConnection, user_id: Uuid) -> Result<bool, ApiError> {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;
        Ok(found.is_some())
    }

    pub async fn user_participated(
        conn: &mut PgConnection,
        poll_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, ApiError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM votes v
             JOIN questions q ON q.id = v.question_id
             WHERE q.poll_id = $1 AND v.user_id = $2",
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(count > 0)
    }

    /// Distinct polls the user voted in, every question annotated with that
    /// user's own vote(s).
    pub async fn list_voted_polls(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<VotedPoll>, ApiError> {
        let rows = sqlx::query_as::<_, PollRow>(
            "SELECT DISTINCT p.id, p.title, p.description, p.start_date, p.end_date
             FROM polls p
             JOIN questions q ON q.poll_id = p.id
             JOIN votes v ON v.question_id = q.id
             WHERE v.user_id = $1
             ORDER BY p.start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut polls = Vec::with_capacity(rows.len());
        for row in rows {
            let questions = Self::load_questions(&mut *conn, row.id).await?;
            let mut voted_questions = Vec::with_capacity(questions.len());
            for question in questions {
                let voted = Self::load_user_votes(&mut *conn, question.id, user_id).await?;
                voted_questions.push(VotedQuestion {
                    id: question.id,
                    poll: question.poll,
                    question_text: question.question_text,
                    question_type: question.question_type,
                    choices: question.choices,
                    voted,
                });
            }
            polls.push(VotedPoll {
                id: row.id,
                title: row.title,
                description: row.description,
                start_date: row.start_date,
                end_date: row.end_date,
                questions: voted_questions,
            });
        }
        Ok(polls)
    }

    async fn load_user_votes(
        conn: &mut PgConnection,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Vote>, ApiError> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT id, question_id, user_id, answer FROM votes
             WHERE question_id = $1 AND user_id = $2",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut votes = Vec::with_capacity(rows.len());
        for row in rows {
            let choices: Vec<Uuid> =
                sqlx::query_scalar("SELECT choice_id FROM vote_choices WHERE vote_id = $1")
                    .bind(row.id)
                    .fetch_all(&mut *conn)
                    .await?;
            votes.push(Vote {
                id: row.id,
                question: row.question_id,
                user: row.user_id,
                answer: row.answer,
                choices,
            });
        }
        Ok(votes)
    }
}
