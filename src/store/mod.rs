//! Persistence boundary for questions, choices, votes and users.
//!
//! Handlers and the voting logic only talk to [`PollStore`], so they run the
//! same against Postgres ([`PgStore`]) and the in-process [`MemoryStore`].

use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{Choice, ChoiceTally, NewQuestion, Question, User, Vote, VoteWrite};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug)]
pub enum StoreError {
    Db(sqlx::Error),
    Invalid(String),
    Duplicate(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(e) => write!(f, "Database error: {e}"),
            StoreError::Invalid(e) => write!(f, "Invalid data: {e}"),
            StoreError::Duplicate(e) => write!(f, "Already exists: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Db(e)
    }
}

/// Repository interface over the poll tables.
///
/// `upsert_vote` must be atomic per (user, question): two concurrent calls
/// for the same pair leave exactly one vote behind.
#[allow(async_fn_in_trait)]
pub trait PollStore {
    /// Questions with `pub_date <= now`, newest first.
    async fn published_questions(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Question>, StoreError>;
    async fn find_question(&self, id: i64) -> Result<Option<Question>, StoreError>;
    async fn count_questions(&self) -> Result<i64, StoreError>;
    async fn create_question(&self, new: &NewQuestion) -> Result<i64, StoreError>;

    /// Choices of a question ordered by id.
    async fn choices_for(&self, question_id: i64) -> Result<Vec<Choice>, StoreError>;
    /// A choice, only if it belongs to `question_id`.
    async fn find_choice(&self, question_id: i64, choice_id: i64) -> Result<Option<Choice>, StoreError>;
    async fn create_choice(&self, question_id: i64, choice_text: &str) -> Result<i64, StoreError>;

    async fn find_vote(&self, user_id: i64, question_id: i64) -> Result<Option<Vote>, StoreError>;
    async fn upsert_vote(&self, user_id: i64, question_id: i64, choice_id: i64) -> Result<VoteWrite, StoreError>;
    /// One tally per choice of the question, zero when nobody picked it.
    async fn count_votes_by_choice(&self, question_id: i64) -> Result<Vec<ChoiceTally>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError>;
}

fn check_choice_text(choice_text: &str) -> Result<(), StoreError> {
    match crate::auth::validate::validate_required(choice_text, "Choice text", crate::models::choice::CHOICE_TEXT_MAX) {
        Some(err) => Err(StoreError::Invalid(err)),
        None => Ok(()),
    }
}

fn check_question(new: &NewQuestion) -> Result<(), StoreError> {
    match new.validate() {
        Some(err) => Err(StoreError::Invalid(err)),
        None => Ok(()),
    }
}
