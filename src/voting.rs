//! Eligibility gating and the one-vote-per-user upsert.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::{AuthenticatedUser, Question, VoteWrite};
use crate::store::{PollStore, StoreError};

/// Why a vote was refused. Nothing is written for any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
    NotPublished,
    NoChoiceSelected,
    EndDatePassed,
    VotingClosed,
}

impl VoteRejection {
    pub fn message(&self) -> &'static str {
        match self {
            VoteRejection::NotPublished => "This question is not currently published.",
            VoteRejection::NoChoiceSelected => "You didn't select a choice.",
            VoteRejection::EndDatePassed => {
                "Voting for this question is not allowed as the end date has passed."
            }
            VoteRejection::VotingClosed => "Voting for this question is not allowed at the moment.",
        }
    }
}

impl fmt::Display for VoteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug)]
pub enum VoteError {
    Rejected(VoteRejection),
    Store(StoreError),
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteError::Rejected(r) => write!(f, "Vote rejected: {r}"),
            VoteError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl From<StoreError> for VoteError {
    fn from(e: StoreError) -> Self {
        VoteError::Store(e)
    }
}

impl From<VoteRejection> for VoteError {
    fn from(r: VoteRejection) -> Self {
        VoteError::Rejected(r)
    }
}

/// Outcome of an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    pub choice_id: i64,
    pub write: VoteWrite,
}

/// Record `user`'s selection for `question`.
///
/// Checks run in a fixed order: publication, choice, end date, voting
/// window. `choice_id` is `None` when the form carried no usable value.
pub async fn cast_vote<S: PollStore>(
    store: &S,
    user: &AuthenticatedUser,
    question: &Question,
    choice_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<VoteReceipt, VoteError> {
    if !question.is_published(now) {
        return Err(VoteRejection::NotPublished.into());
    }

    let choice = match choice_id {
        Some(id) => store.find_choice(question.id, id).await?,
        None => None,
    };
    let Some(choice) = choice else {
        return Err(VoteRejection::NoChoiceSelected.into());
    };

    if question.has_ended(now) {
        return Err(VoteRejection::EndDatePassed.into());
    }
    if !question.can_vote(now) {
        return Err(VoteRejection::VotingClosed.into());
    }

    let write = store.upsert_vote(user.id(), question.id, choice.id).await?;
    match write {
        VoteWrite::Created { vote_id } => log::info!(
            "Vote {} created: user={} question={} choice={}",
            vote_id, user.username(), question.id, choice.id
        ),
        VoteWrite::Updated { vote_id } => log::info!(
            "Vote {} changed: user={} question={} choice={}",
            vote_id, user.username(), question.id, choice.id
        ),
    }

    Ok(VoteReceipt { choice_id: choice.id, write })
}

/// Parse the raw `choice` form value. Blank or non-numeric input is no choice.
pub fn parse_choice(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}
