use sqlx::FromRow;

/// A user's selection for one question. At most one per (user, question).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub choice_id: i64,
}

/// What an upsert did to the (user, question) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteWrite {
    Created { vote_id: i64 },
    Updated { vote_id: i64 },
}

impl VoteWrite {
    pub fn vote_id(&self) -> i64 {
        match self {
            VoteWrite::Created { vote_id } | VoteWrite::Updated { vote_id } => *vote_id,
        }
    }
}
