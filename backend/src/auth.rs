use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::routes::AppState;

/// Acting identity resolved from the `Authorization: Token <key>` header.
/// A missing header is an anonymous caller; an unknown key is rejected.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Option<Uuid>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Guard for the administrative CRUD surface.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub user_id: Uuid,
}

pub fn token_from_header(value: &str) -> Option<&str> {
    value
        .strip_prefix("Token ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

async fn lookup_token(pool: &PgPool, key: &str) -> Result<Option<(Uuid, bool)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, bool)>(
        "SELECT u.id, u.is_admin
         FROM auth_tokens t
         JOIN users u ON u.id = t.user_id
         WHERE t.key = $1",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(header) = req.headers().get_one("Authorization") else {
            return Outcome::Success(Identity::anonymous());
        };
        let Some(key) = token_from_header(header) else {
            debug!("malformed Authorization header");
            return Outcome::Error((Status::Unauthorized, ()));
        };
        let Some(state) = req.rocket().state::<AppState>() else {
            return Outcome::Error((Status::InternalServerError, ()));
        };
        match lookup_token(&state.db, key).await {
            Ok(Some((user_id, _))) => Outcome::Success(Identity {
                user_id: Some(user_id),
            }),
            Ok(None) => {
                debug!("unknown auth token");
                Outcome::Error((Status::Unauthorized, ()))
            }
            Err(e) => {
                tracing::error!("token lookup failed: {}", e);
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(key) = req
            .headers()
            .get_one("Authorization")
            .and_then(token_from_header)
        else {
            return Outcome::Error((Status::Unauthorized, ()));
        };
        let Some(state) = req.rocket().state::<AppState>() else {
            return Outcome::Error((Status::InternalServerError, ()));
        };
        match lookup_token(&state.db, key).await {
            Ok(Some((user_id, true))) => Outcome::Success(AdminUser { user_id }),
            Ok(Some(_)) => Outcome::Error((Status::Forbidden, ())),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                tracing::error!("token lookup failed: {}", e);
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
