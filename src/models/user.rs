use std::future::{Ready, ready};

use actix_session::SessionExt;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::auth::session;
use crate::errors::AppError;

/// Internal user row used for authentication; includes the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Proof that the current request belongs to a logged-in user.
///
/// Handlers that take this extractor never run for anonymous requests.
/// It can only be obtained from the session or from a verified `User`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    id: i64,
    username: String,
}

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let user = session::get_user_id(&session)
            .zip(session::get_username(&session).ok())
            .map(|(id, username)| AuthenticatedUser { id, username })
            .ok_or(AppError::Unauthenticated);
        ready(user)
    }
}
