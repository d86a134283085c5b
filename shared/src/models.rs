use serde::{Serialize, Deserialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// How a question expects to be answered. Stored as the Postgres enum
/// `question_type` and carried over the wire as the upper-snake tag.
#[cfg_attr(feature = "backend", derive(sqlx::Type))]
#[cfg_attr(feature = "backend", sqlx(type_name = "question_type", rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    TextAnswer,
    SingleChoice,
    MultipleChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub poll: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: Uuid,
    pub question: Uuid,
    pub choice_text: String,
}

/// One recorded answer to one question. `user` is None for anonymous
/// voters; `choices` is populated only for choice-type questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub question: Uuid,
    pub user: Option<Uuid>,
    pub answer: Option<String>,
    pub choices: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
}

/// Poll edits cannot move the start date, so the payload has no field for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest {
    pub title: String,
    pub description: Option<String>,
    pub end_date: OffsetDateTime,
}

/// Choice payload for question creation: text only, the id is minted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChoice {
    pub choice_text: String,
}

/// Choice payload for question update. With an id it renames that existing
/// choice (the id must belong to the question); without one it creates a
/// new choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceInput {
    pub id: Option<Uuid>,
    pub choice_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub poll: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub choices: Vec<NewChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub choices: Vec<ChoiceInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChoiceRequest {
    pub question: Uuid,
    pub choice_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChoiceRequest {
    pub choice_text: String,
}

/// One proposed answer inside a poll response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteEntry {
    pub question: Uuid,
    #[serde(default)]
    pub choices: Vec<Uuid>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// A full poll response: one entry per question, committed atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillPollRequest {
    pub poll: Uuid,
    pub votes: Vec<VoteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillPollResponse {
    pub success: bool,
    pub poll: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotedQuestion {
    pub id: Uuid,
    pub poll: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub choices: Vec<Choice>,
    pub voted: Vec<Vote>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotedPoll {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub questions: Vec<VotedQuestion>,
}

impl Poll {
    /// Voting eligibility: strict bounds, closed at the exact boundary
    /// instants.
    pub fn is_open(&self, now: OffsetDateTime) -> bool {
        self.start_date < now && now < self.end_date
    }

    /// Active-poll listing: inclusive bounds. Looser than `is_open`; the
    /// two checks are intentionally not unified.
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    pub fn question_ids(&self) -> Vec<Uuid> {
        self.questions.iter().map(|q| q.id).collect()
    }
}
