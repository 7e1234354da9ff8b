use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

use crate::auth::validate;

pub const QUESTION_TEXT_MAX: usize = 200;

/// A poll prompt with its publish window.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Question {
    /// Published once the calendar day of `pub_date` has been reached,
    /// regardless of the time of day.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        now.date_naive() >= self.pub_date.date_naive()
    }

    /// True while `pub_date <= now <= end_date`.
    ///
    /// Without an end date the upper bound is `now` itself, so only the
    /// lower bound is ever checked.
    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now && now <= self.end_date.unwrap_or(now)
    }

    /// Published within the last 24 hours. Future-dated questions are not recent.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    /// Listed on the index and reachable through the detail page.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_some_and(|end| now > end)
    }
}

/// Data for creating a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl NewQuestion {
    pub fn new(question_text: impl Into<String>, pub_date: DateTime<Utc>) -> Self {
        Self {
            question_text: question_text.into(),
            pub_date,
            end_date: None,
        }
    }

    pub fn ending(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Returns the first problem found, if any.
    pub fn validate(&self) -> Option<String> {
        if let Some(err) = validate::validate_required(&self.question_text, "Question text", QUESTION_TEXT_MAX) {
            return Some(err);
        }
        match self.end_date {
            Some(end) if end < self.pub_date => {
                Some("End date must not be earlier than the publish date".to_string())
            }
            _ => None,
        }
    }
}
