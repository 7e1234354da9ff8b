use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::AuthenticatedUser;

const USER_ID: &str = "user_id";
const USERNAME: &str = "username";
const FLASH: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub text: String,
}

impl Flash {
    /// CSS class suffix used by the templates.
    pub fn css(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

/// Cookie-backed session layer shared by the server and the test harness.
pub fn middleware(key: Key, cookie_secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .build()
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID).unwrap_or(None)
}

pub fn get_username(session: &Session) -> Result<String, String> {
    match session.get::<String>(USERNAME) {
        Ok(Some(username)) => Ok(username),
        Ok(None) => Err("No username in session".to_string()),
        Err(e) => Err(format!("Session error: {}", e)),
    }
}

/// Bind the session to `user`. The old session id is discarded first.
pub fn log_in(session: &Session, user: &AuthenticatedUser) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_ID, user.id())
        .and_then(|_| session.insert(USERNAME, user.username()))
        .map_err(|e| AppError::Session(format!("Failed to store login: {}", e)))
}

pub fn log_out(session: &Session) {
    session.purge();
}

pub fn set_flash(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let flash = Flash { level, text: text.into() };
    if let Err(e) = session.insert(FLASH, &flash) {
        log::warn!("Failed to store flash message: {}", e);
    }
}

pub fn take_flash(session: &Session) -> Option<Flash> {
    let flash = session.get::<Flash>(FLASH).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH);
    }
    flash
}
