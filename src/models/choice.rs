use sqlx::FromRow;

pub const CHOICE_TEXT_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
}

/// Vote count for one choice, derived from vote rows.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChoiceTally {
    pub choice_id: i64,
    pub choice_text: String,
    pub votes: i64,
}
