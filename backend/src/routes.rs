use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::auth::{AdminUser, Identity};
use crate::error::ApiError;
use crate::processor::VoteProcessor;
use crate::queries::Queries;
use crate::utils::parse_id;
use shared::models::*;

pub struct AppState {
    pub db: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self { db: pool }
    }
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[get("/polls")]
pub async fn list_polls(
    state: &State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Poll>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    Queries::list_polls(&mut conn).await.map(Json)
}

#[post("/polls", format = "json", data = "<request>")]
pub async fn create_poll(
    state: &State<AppState>,
    _admin: AdminUser,
    request: Json<CreatePollRequest>,
) -> Result<(Status, Json<Poll>), ApiError> {
    let poll = Queries::create_poll(&state.db, &request.into_inner()).await?;
    debug!("poll created: {}", poll.id);
    Ok((Status::Created, Json(poll)))
}

#[get("/polls/<id>")]
pub async fn get_poll(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
) -> Result<Json<Poll>, ApiError> {
    let id = parse_id(id)?;
    let mut conn = state.db.acquire().await?;
    Queries::fetch_poll(&mut conn, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[put("/polls/<id>", format = "json", data = "<request>")]
pub async fn update_poll(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
    request: Json<UpdatePollRequest>,
) -> Result<Json<Poll>, ApiError> {
    let id = parse_id(id)?;
    Queries::update_poll(&state.db, id, &request.into_inner())
        .await
        .map(Json)
}

#[delete("/polls/<id>")]
pub async fn delete_poll(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
) -> Result<Status, ApiError> {
    let id = parse_id(id)?;
    Queries::delete_poll(&state.db, id).await?;
    Ok(Status::NoContent)
}

#[post("/questions", format = "json", data = "<request>")]
pub async fn create_question(
    state: &State<AppState>,
    _admin: AdminUser,
    request: Json<CreateQuestionRequest>,
) -> Result<(Status, Json<Question>), ApiError> {
    let question = Queries::create_question(&state.db, &request.into_inner()).await?;
    Ok((Status::Created, Json(question)))
}

#[get("/questions/<id>")]
pub async fn get_question(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
) -> Result<Json<Question>, ApiError> {
    let id = parse_id(id)?;
    let mut conn = state.db.acquire().await?;
    Queries::fetch_question(&mut conn, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[put("/questions/<id>", format = "json", data = "<request>")]
pub async fn update_question(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
    request: Json<UpdateQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    let id = parse_id(id)?;
    Queries::update_question(&state.db, id, &request.into_inner())
        .await
        .map(Json)
}

#[delete("/questions/<id>")]
pub async fn delete_question(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
) -> Result<Status, ApiError> {
    let id = parse_id(id)?;
    Queries::delete_question(&state.db, id).await?;
    Ok(Status::NoContent)
}

#[post("/choices", format = "json", data = "<request>")]
pub async fn create_choice(
    state: &State<AppState>,
    _admin: AdminUser,
    request: Json<CreateChoiceRequest>,
) -> Result<(Status, Json<Choice>), ApiError> {
    let choice = Queries::create_choice(&state.db, &request.into_inner()).await?;
    Ok((Status::Created, Json(choice)))
}

#[get("/choices/<id>")]
pub async fn get_choice(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
) -> Result<Json<Choice>, ApiError> {
    let id = parse_id(id)?;
    let mut conn = state.db.acquire().await?;
    Queries::fetch_choice(&mut conn, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

#[put("/choices/<id>", format = "json", data = "<request>")]
pub async fn update_choice(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
    request: Json<UpdateChoiceRequest>,
) -> Result<Json<Choice>, ApiError> {
    let id = parse_id(id)?;
    Queries::update_choice(&state.db, id, &request.into_inner())
        .await
        .map(Json)
}

#[delete("/choices/<id>")]
pub async fn delete_choice(
    state: &State<AppState>,
    _admin: AdminUser,
    id: &str,
) -> Result<Status, ApiError> {
    let id = parse_id(id)?;
    Queries::delete_choice(&state.db, id).await?;
    Ok(Status::NoContent)
}

/// Polls currently inside their window, inclusive at both bounds.
#[get("/active-polls")]
pub async fn active_polls(state: &State<AppState>) -> Result<Json<Vec<Poll>>, ApiError> {
    let mut conn = state.db.acquire().await?;
    Queries::list_active_polls(&mut conn, OffsetDateTime::now_utc())
        .await
        .map(Json)
}

#[instrument(skip(state, request), fields(poll_id = %request.poll))]
#[post("/vote", format = "json", data = "<request>")]
pub async fn submit_vote(
    state: &State<AppState>,
    identity: Identity,
    request: Json<FillPollRequest>,
) -> Result<(Status, Json<FillPollResponse>), ApiError> {
    let request = request.into_inner();
    let poll = VoteProcessor::submit_poll_response(
        &state.db,
        request.poll,
        identity.user_id,
        OffsetDateTime::now_utc(),
        &request.votes,
    )
    .await?;
    Ok((Status::Created, Json(FillPollResponse { success: true, poll })))
}

/// Polls the given user participated in, each question annotated with the
/// user's own votes. 404 when the user id is unknown.
#[get("/voted/<user_id>")]
pub async fn voted_polls(
    state: &State<AppState>,
    user_id: &str,
) -> Result<Json<Vec<VotedPoll>>, ApiError> {
    let user_id = parse_id(user_id)?;
    let mut conn = state.db.acquire().await?;
    if !Queries::user_exists(&mut conn, user_id).await? {
        return Err(ApiError::NotFound);
    }
    Queries::list_voted_polls(&mut conn, user_id).await.map(Json)
}
