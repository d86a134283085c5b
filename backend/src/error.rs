use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::error::ErrorResponse;
use shared::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Resource not found")]
    NotFound,
    #[error("Invalid id")]
    InvalidId,
    #[error("Invalid or missing auth token")]
    Unauthorized,
    #[error("Permission denied")]
    Forbidden,
    #[error("Database error: {0}")]
    Database(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::NotFound => Status::NotFound,
            ApiError::InvalidId => Status::BadRequest,
            ApiError::Unauthorized => Status::Unauthorized,
            ApiError::Forbidden => Status::Forbidden,
            ApiError::Database(_) => Status::InternalServerError,
        }
    }

    pub(crate) fn body(&self) -> ErrorResponse {
        let status = self.status().code;
        match self {
            ApiError::Validation(e) => match e.field() {
                Some(field) => ErrorResponse::with_field(e.to_string(), field, status),
                None => ErrorResponse::new(e.to_string(), status),
            },
            // Database details stay in the logs.
            ApiError::Database(_) => ErrorResponse::new("Internal server error", status),
            other => ErrorResponse::new(other.to_string(), status),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        if let ApiError::Database(ref details) = self {
            tracing::error!("request failed: {}", details);
        }
        let status = self.status();
        rocket::Response::build_from(Json(self.body()).respond_to(req)?)
            .status(status)
            .ok()
    }
}
